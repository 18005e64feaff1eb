//! Whole levels, a U8 archive holding up to four areas
//!
//! ```text
//! course/
//!     course1.bin
//!     course1_bgdatL0.bin
//!     course1_bgdatL1.bin
//!     course1_bgdatL2.bin
//!     course2.bin
//!     ...
//! ```
//!
//! Layer files are optional, a missing file is an empty layer.

use nsmb_u8::U8Archive;
use tracing::{debug, instrument, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::course::AreaRecordSet;
use crate::error::{Error, Result};
use crate::layer::{load_layer, save_layer, ObjectLayer, LAYER_COUNT};
use crate::variant::{CourseCodec, GameVariant};

/// Folder holding the areas of a level
pub const COURSE_DIR: &str = "course";

/// Archive path of the course file of area `number`, counting from 1
pub fn course_path(number: usize) -> String {
    format!("{COURSE_DIR}/course{number}.bin")
}

/// Archive path of object layer `layer` of area `number`
pub fn layer_path(number: usize, layer: usize) -> String {
    format!("{COURSE_DIR}/course{number}_bgdatL{layer}.bin")
}

/// One area: its records and three object layers
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Area {
    pub records: AreaRecordSet,
    pub layers: [ObjectLayer; LAYER_COUNT],
}

impl Default for Area {
    fn default() -> Self {
        Self {
            records: AreaRecordSet::default(),
            layers: ObjectLayer::all(),
        }
    }
}

impl Area {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of objects over all layers
    pub fn object_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.len()).sum()
    }

    fn read(
        archive: &U8Archive,
        number: usize,
        course: &[u8],
        codec: &dyn CourseCodec,
    ) -> Result<Self> {
        let name = course_path(number);
        let records = codec.load_course(course).map_err(|err| err.in_file(&name))?;

        let mut layers = ObjectLayer::all();
        for (index, layer) in layers.iter_mut().enumerate() {
            let name = layer_path(number, index);
            let data = archive.get(&name).ok().flatten();
            *layer = load_layer(index, data).map_err(|err| err.in_file(&name))?;
        }

        Ok(Self { records, layers })
    }

    fn write(
        &self,
        archive: &mut U8Archive,
        number: usize,
        codec: &dyn CourseCodec,
    ) -> Result<()> {
        let name = course_path(number);
        let course = codec.save_course(&self.records).map_err(|err| err.in_file(&name))?;
        archive.set(&name, Some(course))?;

        for layer in self.layers.iter().filter(|layer| !layer.is_empty()) {
            archive.set(&layer_path(number, layer.index()), Some(save_layer(layer)))?;
        }
        Ok(())
    }
}

/// A level and all of its areas
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Level {
    pub variant: GameVariant,
    pub areas: Vec<Area>,
}

impl Level {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a level of the default game from an archive
    pub fn from_archive(archive: &U8Archive) -> Result<Level> {
        Self::read_archive(archive, GameVariant::default())
    }

    /// Read a level from an archive
    ///
    /// Areas are read from `course1.bin` onwards until the first missing number.
    #[instrument(skip_all, err, fields(%variant))]
    pub fn read_archive(archive: &U8Archive, variant: GameVariant) -> Result<Level> {
        if !matches!(archive.get(COURSE_DIR), Ok(None)) {
            return Err(Error::MissingCourseFolder);
        }

        let codec = variant.codec();
        let mut areas = Vec::new();
        for number in 1.. {
            let Some(course) = archive.get(&course_path(number)).ok().flatten() else {
                break;
            };
            trace!(number, size = course.len(), "reading area");
            areas.push(Area::read(archive, number, course, codec)?);
        }

        if areas.is_empty() {
            return Err(Error::NoAreas);
        }

        debug!(areas = areas.len(), "read level");
        Ok(Level { variant, areas })
    }

    /// Build the archive holding this level
    #[instrument(skip_all, err)]
    pub fn to_archive(&self) -> Result<U8Archive> {
        let mut archive = U8Archive::new();
        archive.set(COURSE_DIR, None)?;

        let codec = self.variant.codec();
        for (index, area) in self.areas.iter().enumerate() {
            area.write(&mut archive, index + 1, codec)?;
        }

        Ok(archive)
    }

    /// Read a level from a raw or compressed archive
    pub fn from_bytes(data: &[u8]) -> Result<Level> {
        let raw = nsmb_lz::decompress(data)?;
        Self::from_archive(&U8Archive::from_bytes(&raw)?)
    }

    /// Serialize the archive holding this level, LZ77 compressed if asked
    pub fn to_bytes(&self, compress: bool) -> Result<Vec<u8>> {
        let raw = self.to_archive()?.to_bytes()?;
        if !compress {
            return Ok(raw);
        }
        nsmb_lz::compress(&raw).ok_or(Error::TooLargeToCompress(raw.len()))
    }
}

/// Add an area after the last one already in `archive`, returning its number
///
/// Existing entries are left untouched.
pub fn append_area(archive: &mut U8Archive, area: &Area) -> Result<usize> {
    let mut number = 1;
    while archive.contains(&course_path(number)) {
        number += 1;
    }

    archive.set(COURSE_DIR, None)?;
    area.write(archive, number, GameVariant::default().codec())?;

    debug!(number, "appended area");
    Ok(number)
}

#[cfg(test)]
mod test {
    use nsmb_u8::U8Archive;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::error::{Error, Result};
    use crate::layer::LevelObject;
    use crate::level::{append_area, course_path, layer_path, Area, Level};

    fn area(time_limit: i16, objects: usize) -> Area {
        let mut area = Area::new();
        area.records.options.time_limit = time_limit;
        for i in 0..objects {
            area.layers[1].push(LevelObject::new(0, i as u16, i as u16, 0, 1, 1));
        }
        area
    }

    #[test]
    fn paths() {
        assert_eq!(course_path(2), "course/course2.bin");
        assert_eq!(layer_path(1, 0), "course/course1_bgdatL0.bin");
    }

    #[traced_test]
    #[test]
    fn archive_roundtrip() -> Result<()> {
        let level = Level {
            areas: vec![area(300, 2), area(400, 0)],
            ..Default::default()
        };

        let archive = level.to_archive()?;
        assert!(archive.contains(&layer_path(1, 1)));
        assert!(!archive.contains(&layer_path(1, 0)));
        assert!(!archive.contains(&layer_path(2, 1)));

        let read = Level::from_archive(&archive)?;
        assert_eq!(read.areas.len(), 2);
        assert_eq!(read.areas[0].records.options.time_limit, 300);
        assert_eq!(read.areas[0].layers[1].to_vec(), level.areas[0].layers[1].to_vec());
        assert_eq!(read.areas[1].object_count(), 0);

        Ok(())
    }

    #[test]
    fn missing_course_folder() -> Result<()> {
        let mut archive = U8Archive::new();
        archive.set("stage/course1.bin", Some(vec![]))?;

        assert!(matches!(
            Level::from_archive(&archive),
            Err(Error::MissingCourseFolder)
        ));

        Ok(())
    }

    #[test]
    fn no_areas() -> Result<()> {
        let mut archive = U8Archive::new();
        archive.set("course", None)?;

        assert!(matches!(Level::from_archive(&archive), Err(Error::NoAreas)));

        Ok(())
    }

    #[test]
    fn scan_stops_at_gap() -> Result<()> {
        let level = Level {
            areas: vec![area(1, 0), area(2, 0), area(3, 0)],
            ..Default::default()
        };
        let mut archive = level.to_archive()?;
        archive.remove(&course_path(2))?;

        let read = Level::from_archive(&archive)?;
        assert_eq!(read.areas.len(), 1);

        Ok(())
    }

    #[test]
    fn errors_name_the_file() -> Result<()> {
        let mut archive = Level {
            areas: vec![area(1, 0)],
            ..Default::default()
        }
        .to_archive()?;
        archive.set(&course_path(2), Some(vec![0; 0x10]))?;

        match Level::from_archive(&archive) {
            Err(Error::InFile { name, source }) => {
                assert_eq!(name, "course/course2.bin");
                assert!(matches!(*source, Error::TruncatedCourse(0x10)));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        Ok(())
    }

    #[test]
    fn append_after_existing() -> Result<()> {
        let mut archive = Level {
            areas: vec![area(1, 1)],
            ..Default::default()
        }
        .to_archive()?;
        let first = archive.get(&course_path(1))?.map(<[u8]>::to_vec);

        assert_eq!(append_area(&mut archive, &area(2, 3))?, 2);
        assert_eq!(archive.get(&course_path(1))?.map(<[u8]>::to_vec), first);

        let read = Level::from_archive(&archive)?;
        assert_eq!(read.areas.len(), 2);
        assert_eq!(read.areas[1].object_count(), 3);

        Ok(())
    }

    #[test]
    fn append_to_empty_archive() -> Result<()> {
        let mut archive = U8Archive::new();
        assert_eq!(append_area(&mut archive, &Area::new())?, 1);
        assert_eq!(Level::from_archive(&archive)?.areas.len(), 1);

        Ok(())
    }

    #[test]
    fn compressed_bytes() -> Result<()> {
        let level = Level {
            areas: vec![area(300, 4)],
            ..Default::default()
        };

        let raw = level.to_bytes(false)?;
        let compressed = level.to_bytes(true)?;
        assert_eq!(compressed[0], 0x11);

        let from_raw = Level::from_bytes(&raw)?;
        let from_compressed = Level::from_bytes(&compressed)?;
        assert_eq!(from_raw, from_compressed);
        assert_eq!(from_raw.areas[0].object_count(), 4);

        Ok(())
    }
}
