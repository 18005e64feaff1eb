//! Games sharing the level format

use derive_more::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::course::{self, AreaRecordSet};
use crate::error::Result;

/// Reads and writes the course files of one game
pub trait CourseCodec {
    fn load_course(&self, data: &[u8]) -> Result<AreaRecordSet>;

    fn save_course(&self, course: &AreaRecordSet) -> Result<Vec<u8>>;
}

/// Course files of New Super Mario Bros. Wii
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Nsmbw;

impl CourseCodec for Nsmbw {
    fn load_course(&self, data: &[u8]) -> Result<AreaRecordSet> {
        course::load_course(data)
    }

    fn save_course(&self, course: &AreaRecordSet) -> Result<Vec<u8>> {
        course::save_course(course)
    }
}

/// Game a level belongs to
#[derive(Debug, Default, Display, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GameVariant {
    #[default]
    #[display("New Super Mario Bros. Wii")]
    Nsmbw,
}

impl GameVariant {
    /// Codec for the course files of this game
    pub fn codec(self) -> &'static dyn CourseCodec {
        match self {
            GameVariant::Nsmbw => &Nsmbw,
        }
    }
}
