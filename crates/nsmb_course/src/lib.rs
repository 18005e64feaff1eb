//! This library handles reading from and creating the level files of *New Super Mario Bros. Wii*.
//!
//! # Level Format Documentation
//!
//! A level is a U8 archive, usually LZ77 compressed, whose `course` folder holds one course file
//! and up to three object layer files per area. See [`level`] for the archive layout.
//!
//! ## Course Files
//!
//! | Offset (bytes) | Field       | Description                                                     |
//! |----------------|-------------|-----------------------------------------------------------------|
//! | 0x0000         | Block table | 14 × (offset, length), 4 bytes each, big-endian                 |
//! | 0x0070         | Metadata    | Editor annotations up to the first block, see [`metadata`]      |
//! | variable       | Blocks      | Fixed size records, see [`course`] and [`types`]                |
//!
//! ## Additional Information
//!
//! - Every integer is big-endian.
//! - Sprite and entrance zones, and the list of sprite kinds to load, are derived from the rest of
//!   the course when saving.
//! - Object layers are separate files, see [`layer`].
//!
//! ```
//! # fn doit() -> nsmb_course::error::Result<()>
//! # {
//! use nsmb_course::{Area, Level, LevelObject};
//!
//! let mut area = Area::new();
//! area.records.tilesets.names[0] = "Pa0_jyotyu".to_string();
//! area.layers[1].push(LevelObject::new(0, 0x3C, 0, 20, 16, 2));
//!
//! let level = Level { areas: vec![area], ..Default::default() };
//! let bytes = level.to_bytes(true)?;
//!
//! let read = Level::from_bytes(&bytes)?;
//! assert_eq!(read.areas[0].layers[1].len(), 1);
//! # Ok(())
//! # }
//! # doit().unwrap();
//! ```

pub mod course;
pub mod error;
pub mod layer;
pub mod legacy;
pub mod level;
pub mod metadata;
pub mod types;
pub mod variant;
pub mod zone;

pub use course::{load_course, save_course, AreaRecordSet, ZoneBinding};
pub use layer::{load_layer, save_layer, LevelObject, ObjectLayer};
pub use level::{append_area, Area, Level};
pub use metadata::Metadata;
pub use variant::{CourseCodec, GameVariant, Nsmbw};
pub use zone::zone_for_position;
