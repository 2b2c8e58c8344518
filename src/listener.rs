//! The listener, its two ears, and the lock-free handle through which it is moved while
//! audio is playing.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use log::trace;

use crate::error::{Error, Result};
use crate::geometry::{Spatial, Vec2};

/// Default distance between the two ears, in world units.
pub const DEFAULT_EAR_SEPARATION: f32 = 0.15;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EarSide {
    Left,
    Right,
}

impl EarSide {
    /// Index of this ear in [`Listener::ears`] and of its output channel.
    pub fn index(self) -> usize {
        match self {
            EarSide::Left => 0,
            EarSide::Right => 1,
        }
    }
}

/// One detection point of a listener.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ear {
    side: EarSide,
    position: Vec2,
}

impl Ear {
    pub fn side(&self) -> EarSide {
        self.side
    }
}

impl Spatial for Ear {
    fn position(&self) -> Vec2 {
        self.position
    }
}

/// A listener with two ears on a horizontal axis through its position.
///
/// The ears are derived from the position and separation every time either changes;
/// they cannot be moved on their own.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Listener {
    position: Vec2,
    ear_separation: f32,
    ears: [Ear; 2],
}

impl Default for Listener {
    fn default() -> Self {
        Listener::new()
    }
}

impl Listener {
    /// Listener at the origin with the default ear separation.
    pub fn new() -> Self {
        Listener::with_geometry(Vec2::ZERO, DEFAULT_EAR_SEPARATION)
    }

    /// Listener at the origin with a custom ear separation.
    pub fn with_ear_separation(ear_separation: f32) -> Result<Self> {
        if !ear_separation.is_finite() || ear_separation <= 0.0 {
            return Err(Error::InvalidConfig(
                "ear separation must be finite and positive",
            ));
        }
        Ok(Listener::with_geometry(Vec2::ZERO, ear_separation))
    }

    fn with_geometry(position: Vec2, ear_separation: f32) -> Self {
        let half = Vec2::new(ear_separation / 2.0, 0.0);
        Listener {
            position,
            ear_separation,
            ears: [
                Ear {
                    side: EarSide::Left,
                    position: position - half,
                },
                Ear {
                    side: EarSide::Right,
                    position: position + half,
                },
            ],
        }
    }

    /// Move the listener and both of its ears.
    pub fn set_position(&mut self, position: Vec2) -> Result<()> {
        let position = position.validated()?;
        *self = Listener::with_geometry(position, self.ear_separation);
        Ok(())
    }

    /// A copy of this listener moved to `position`.
    pub fn moved_to(mut self, position: Vec2) -> Result<Self> {
        self.set_position(position)?;
        Ok(self)
    }

    pub fn ear_separation(&self) -> f32 {
        self.ear_separation
    }

    /// Both ears, left first.
    pub fn ears(&self) -> &[Ear; 2] {
        &self.ears
    }

    pub fn ear(&self, side: EarSide) -> &Ear {
        &self.ears[side.index()]
    }
}

impl Spatial for Listener {
    fn position(&self) -> Vec2 {
        self.position
    }
}

/// Shared handle for moving a listener while a renderer reads it.
///
/// Every update publishes a complete new [`Listener`], so readers always observe a
/// position together with the ears derived from it. Reading is a single atomic load
/// and never waits on a writer.
///
/// The snapshot an update replaces stays in `retired` until the next update, so it is
/// normally freed on the writing thread rather than inside the audio callback.
pub struct ListenerController {
    listener: ArcSwap<Listener>,
    retired: Mutex<Option<Arc<Listener>>>,
}

impl ListenerController {
    pub fn new(listener: Listener) -> Arc<Self> {
        Arc::new(ListenerController {
            listener: ArcSwap::from_pointee(listener),
            retired: Mutex::new(None),
        })
    }

    /// Current listener geometry.
    #[inline]
    pub fn snapshot(&self) -> Listener {
        **self.listener.load()
    }

    /// Move the listener; non-finite positions are rejected and leave it where it was.
    pub fn set_position(&self, position: Vec2) -> Result<()> {
        let position = position.validated()?;
        let previous = self
            .listener
            .rcu(|current| Listener::with_geometry(position, current.ear_separation));
        self.retire(previous);
        trace!("listener moved to ({}, {})", position.x, position.y);
        Ok(())
    }

    /// Replace the whole listener, e.g. to change its ear separation.
    pub fn replace(&self, listener: Listener) {
        let previous = self.listener.swap(Arc::new(listener));
        self.retire(previous);
    }

    fn retire(&self, previous: Arc<Listener>) {
        // Drops the snapshot retired by the update before this one.
        if let Ok(mut retired) = self.retired.lock() {
            *retired = Some(previous);
        }
    }
}
