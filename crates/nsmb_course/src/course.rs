//! Course files, `course/courseN.bin`
//!
//! A course starts with a table of 14 `(offset, length)` pairs, followed by editor metadata and
//! the blocks themselves:
//!
//! | Block | Contents                  | Record           |
//! |-------|---------------------------|------------------|
//! | 0     | Tileset names             | [`Tilesets`]     |
//! | 1     | Area options              | [`Options`]      |
//! | 2     | Camera bounds             | [`BoundingBox`]  |
//! | 3     | More area options         | [`ExtraOptions`] |
//! | 4     | Backgrounds, layer A      | [`Background`]   |
//! | 5     | Backgrounds, layer B      | [`Background`]   |
//! | 6     | Entrances                 | [`Entrance`]     |
//! | 7     | Sprites                   | [`Sprite`]       |
//! | 8     | Sprite kinds to load      | [`LoadedSprite`] |
//! | 9     | Zones                     | [`Zone`]         |
//! | 10    | Locations                 | [`Location`]     |
//! | 11    | Camera profiles, kept raw |                  |
//! | 12    | Paths                     | [`Path`]         |
//! | 13    | Path nodes                | [`PathNode`]     |

use binrw::meta::{ReadEndian, WriteEndian};
use binrw::{BinRead, BinWrite};
use std::collections::BTreeSet;
use std::io::Cursor;
use tracing::{debug, instrument, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metadata::Metadata;
use crate::types::*;
use crate::zone::zone_for_position;

/// Number of blocks in a course
pub const BLOCK_COUNT: usize = 14;

/// Size of the block table, metadata starts right after it
pub const BLOCK_TABLE_SIZE: usize = BLOCK_COUNT * BlockEntry::SIZE;

/// Every record of one area
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AreaRecordSet {
    pub tilesets: Tilesets,
    pub options: Options,
    pub bounding: Vec<BoundingBox>,
    pub extra_options: ExtraOptions,
    pub backgrounds_a: Vec<Background>,
    pub backgrounds_b: Vec<Background>,
    pub entrances: Vec<Entrance>,
    pub sprites: Vec<Sprite>,
    pub zones: Vec<Zone>,
    pub locations: Vec<Location>,

    /// Block 11, written back unchanged
    pub camera_profiles: Vec<u8>,
    pub paths: Vec<Path>,
    pub path_nodes: Vec<PathNode>,

    #[cfg_attr(feature = "serde", serde(skip))]
    pub metadata: Metadata,
}

/// Records a zone refers to, as indices into the lists of an [`AreaRecordSet`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ZoneBinding {
    pub zone: usize,
    pub bounding: usize,
    pub background_a: usize,
    pub background_b: usize,
}

fn block<'a>(data: &'a [u8], index: usize, entry: &BlockEntry) -> Result<&'a [u8]> {
    let start = entry.offset as usize;
    start
        .checked_add(entry.length as usize)
        .and_then(|end| data.get(start..end))
        .ok_or(Error::BlockOutOfRange {
            block: index,
            offset: entry.offset,
            length: entry.length,
            len: data.len(),
        })
}

/// Decode a block holding a single record, too short blocks give the default record
fn read_single<T>(block: &[u8]) -> Result<T>
where
    T: for<'a> BinRead<Args<'a> = ()> + ReadEndian + Record + Default,
{
    if block.len() < T::SIZE {
        trace!(len = block.len(), "short block, using defaults");
        return Ok(T::default());
    }
    Ok(T::read(&mut Cursor::new(block))?)
}

/// Decode every complete record of a block
fn read_records<T>(block: &[u8]) -> Result<Vec<T>>
where
    T: for<'a> BinRead<Args<'a> = ()> + ReadEndian + Record,
{
    let chunks = block.chunks_exact(T::SIZE);
    if !chunks.remainder().is_empty() {
        trace!(extra = chunks.remainder().len(), "ignoring partial record");
    }
    chunks
        .map(|chunk| T::read(&mut Cursor::new(chunk)).map_err(Error::from))
        .collect()
}

fn write_records<'r, T>(records: impl IntoIterator<Item = &'r T>) -> Result<Vec<u8>>
where
    T: for<'a> BinWrite<Args<'a> = ()> + WriteEndian + 'r,
{
    let mut writer = Cursor::new(Vec::new());
    for record in records {
        record.write(&mut writer)?;
    }
    Ok(writer.into_inner())
}

/// Decode a course file
#[instrument(skip_all, err, fields(size = data.len()))]
pub fn load_course(data: &[u8]) -> Result<AreaRecordSet> {
    if data.len() < BLOCK_TABLE_SIZE {
        return Err(Error::TruncatedCourse(data.len()));
    }

    let table = <[BlockEntry; BLOCK_COUNT]>::read_be(&mut Cursor::new(data))?;
    let blocks = table
        .iter()
        .enumerate()
        .map(|(index, entry)| block(data, index, entry))
        .collect::<Result<Vec<_>>>()?;

    let metadata_end = (table[0].offset as usize).max(BLOCK_TABLE_SIZE);
    let metadata = Metadata::parse(data.get(BLOCK_TABLE_SIZE..metadata_end));

    let sprites = blocks[7]
        .chunks_exact(Sprite::SIZE)
        .take_while(|chunk| chunk[..4] != SPRITE_TERMINATOR)
        .map(|chunk| Sprite::read(&mut Cursor::new(chunk)).map_err(Error::from))
        .collect::<Result<Vec<_>>>()?;

    let course = AreaRecordSet {
        tilesets: read_single(blocks[0])?,
        options: read_single::<RawOptions>(blocks[1])?.into(),
        bounding: read_records(blocks[2])?,
        extra_options: read_single(blocks[3])?,
        backgrounds_a: read_records(blocks[4])?,
        backgrounds_b: read_records(blocks[5])?,
        entrances: read_records(blocks[6])?,
        sprites,
        zones: read_records(blocks[9])?,
        locations: read_records(blocks[10])?,
        camera_profiles: blocks[11].to_vec(),
        paths: read_records(blocks[12])?,
        path_nodes: read_records(blocks[13])?,
        metadata,
    };

    debug!(
        zones = course.zones.len(),
        sprites = course.sprites.len(),
        entrances = course.entrances.len(),
        "loaded course"
    );
    Ok(course)
}

/// Encode a course file
///
/// Sprite and entrance zones are recomputed from their positions, sprites are grouped by zone and
/// the table of sprite kinds to load is rebuilt.
#[instrument(skip_all, err)]
pub fn save_course(course: &AreaRecordSet) -> Result<Vec<u8>> {
    let zone_of = |x: i32, y: i32| zone_for_position(&course.zones, x, y).unwrap_or(0);

    let mut sprites = course.sprites.clone();
    for sprite in &mut sprites {
        sprite.zone = zone_of(sprite.x as i32, sprite.y as i32);
    }
    sprites.sort_by_key(|sprite| sprite.zone);

    let mut entrances = course.entrances.clone();
    for entrance in &mut entrances {
        entrance.zone = zone_of(entrance.x as i32, entrance.y as i32);
    }

    let loaded: Vec<LoadedSprite> = loaded_sprite_kinds(&sprites)
        .into_iter()
        .map(|kind| LoadedSprite { kind })
        .collect();

    let mut sprite_block = write_records(&sprites)?;
    sprite_block.extend_from_slice(&SPRITE_TERMINATOR);

    let blocks: [Vec<u8>; BLOCK_COUNT] = [
        write_records([&course.tilesets])?,
        write_records([&RawOptions::from(&course.options)])?,
        write_records(&course.bounding)?,
        write_records([&course.extra_options])?,
        write_records(&course.backgrounds_a)?,
        write_records(&course.backgrounds_b)?,
        write_records(&entrances)?,
        sprite_block,
        write_records(&loaded)?,
        write_records(&course.zones)?,
        write_records(&course.locations)?,
        course.camera_profiles.clone(),
        write_records(&course.paths)?,
        write_records(&course.path_nodes)?,
    ];

    let mut metadata = course.metadata.serialize();
    metadata.resize(metadata.len().next_multiple_of(4), 0);

    let mut offset = BLOCK_TABLE_SIZE + metadata.len();
    let mut table = [BlockEntry::default(); BLOCK_COUNT];
    for (entry, block) in table.iter_mut().zip(&blocks) {
        *entry = BlockEntry {
            offset: offset as u32,
            length: block.len() as u32,
        };
        offset += block.len();
    }

    let mut writer = Cursor::new(Vec::with_capacity(offset));
    table.write_be(&mut writer)?;
    let mut out = writer.into_inner();
    out.extend_from_slice(&metadata);
    for block in &blocks {
        out.extend_from_slice(block);
    }

    debug!(size = out.len(), loaded = loaded.len(), "saved course");
    Ok(out)
}

/// Sorted distinct sprite kinds
fn loaded_sprite_kinds(sprites: &[Sprite]) -> Vec<u16> {
    sprites
        .iter()
        .map(|sprite| sprite.kind)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl AreaRecordSet {
    /// Sprite kinds the game has to load for this area, as written by [`save_course`]
    pub fn loaded_sprite_kinds(&self) -> Vec<u16> {
        loaded_sprite_kinds(&self.sprites)
    }

    /// Id of the zone a position belongs to
    pub fn zone_for_position(&self, x: i32, y: i32) -> Option<u8> {
        zone_for_position(&self.zones, x, y)
    }

    pub fn bounding_for(&self, zone: &Zone) -> Option<&BoundingBox> {
        self.bounding
            .iter()
            .find(|bounding| bounding.id == zone.bounding_id as u16)
    }

    pub fn background_a_for(&self, zone: &Zone) -> Option<&Background> {
        self.backgrounds_a
            .iter()
            .find(|background| background.id == zone.bg_a_id as u16)
    }

    pub fn background_b_for(&self, zone: &Zone) -> Option<&Background> {
        self.backgrounds_b
            .iter()
            .find(|background| background.id == zone.bg_b_id as u16)
    }

    /// Nodes of a path, clipped to the nodes that exist
    pub fn nodes_for(&self, path: &Path) -> &[PathNode] {
        let start = (path.start_node as usize).min(self.path_nodes.len());
        let end = (start + path.node_count as usize).min(self.path_nodes.len());
        &self.path_nodes[start..end]
    }

    /// Resolve the bounding box and backgrounds of every zone
    pub fn bind(&self) -> Result<Vec<ZoneBinding>> {
        self.zones
            .iter()
            .enumerate()
            .map(|(index, zone)| {
                let resolve = |kind, id: u8, found: Option<usize>| {
                    found.ok_or(Error::UnresolvedReference {
                        zone: zone.id,
                        kind,
                        id,
                    })
                };

                Ok(ZoneBinding {
                    zone: index,
                    bounding: resolve(
                        "bounding box",
                        zone.bounding_id,
                        self.bounding
                            .iter()
                            .position(|b| b.id == zone.bounding_id as u16),
                    )?,
                    background_a: resolve(
                        "background A",
                        zone.bg_a_id,
                        self.backgrounds_a
                            .iter()
                            .position(|b| b.id == zone.bg_a_id as u16),
                    )?,
                    background_b: resolve(
                        "background B",
                        zone.bg_b_id,
                        self.backgrounds_b
                            .iter()
                            .position(|b| b.id == zone.bg_b_id as u16),
                    )?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use byteorder::{BigEndian, ByteOrder};
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::course::{load_course, save_course, AreaRecordSet, ZoneBinding, BLOCK_TABLE_SIZE};
    use crate::error::{Error, Result};
    use crate::types::*;

    fn block_entry(data: &[u8], index: usize) -> (usize, usize) {
        let raw = &data[index * 8..index * 8 + 8];
        (
            BigEndian::read_u32(&raw[..4]) as usize,
            BigEndian::read_u32(&raw[4..]) as usize,
        )
    }

    fn zone(id: u8, x: u16, width: u16) -> Zone {
        Zone {
            id,
            x,
            y: 0,
            width,
            height: 0x100,
            bounding_id: id,
            bg_a_id: id,
            bg_b_id: id,
            ..Default::default()
        }
    }

    fn sprite(kind: u16, x: u16) -> Sprite {
        Sprite {
            kind,
            x,
            y: 0x40,
            ..Default::default()
        }
    }

    fn sample() -> AreaRecordSet {
        let mut course = AreaRecordSet::default();
        course.tilesets.names[0] = "Pa0_jyotyu".to_string();
        course.options.time_limit = 300;
        course.zones = vec![zone(0, 0, 0x200), zone(1, 0x400, 0x200)];
        course.bounding = vec![
            BoundingBox {
                id: 1,
                ..Default::default()
            },
            BoundingBox {
                id: 0,
                ..Default::default()
            },
        ];
        course.backgrounds_a = vec![
            Background {
                id: 0,
                ..Default::default()
            },
            Background {
                id: 1,
                ..Default::default()
            },
        ];
        course.backgrounds_b = course.backgrounds_a.clone();
        course.sprites = vec![sprite(20, 0x500), sprite(52, 0x10), sprite(20, 0x20)];
        course.entrances = vec![Entrance {
            x: 0x480,
            y: 0x40,
            ..Default::default()
        }];
        course.paths = vec![Path {
            id: 1,
            start_node: 1,
            node_count: 2,
            loop_flag: 2,
        }];
        course.path_nodes = vec![
            PathNode {
                x: 1,
                ..Default::default()
            },
            PathNode {
                x: 2,
                ..Default::default()
            },
            PathNode {
                x: 3,
                ..Default::default()
            },
        ];
        course
    }

    #[test]
    fn tileset_only_course() -> Result<()> {
        let mut course = AreaRecordSet::default();
        course.tilesets.names[0] = "Pa0_jyotyu".to_string();

        let data = save_course(&course)?;
        let (offset, length) = block_entry(&data, 0);
        assert_eq!(length, 128);
        assert_eq!(&data[offset..offset + 10], b"Pa0_jyotyu");
        assert!(data[offset + 10..offset + 128].iter().all(|b| *b == 0));

        let loaded = load_course(&data)?;
        assert_eq!(loaded.tilesets.names[0], "Pa0_jyotyu");
        assert!(loaded.tilesets.names[1..].iter().all(String::is_empty));

        Ok(())
    }

    #[traced_test]
    #[test]
    fn roundtrip() -> Result<()> {
        let mut course = sample();
        course.metadata.set_string("Title", "1-1")?;

        let data = save_course(&course)?;
        let loaded = load_course(&data)?;

        assert_eq!(loaded.tilesets, course.tilesets);
        assert_eq!(loaded.options, course.options);
        assert_eq!(loaded.zones, course.zones);
        assert_eq!(loaded.paths, course.paths);
        assert_eq!(loaded.path_nodes, course.path_nodes);
        assert_eq!(loaded.metadata.string("Title"), Some("1-1".to_string()));

        // a second pass changes nothing
        assert_eq!(save_course(&loaded)?, data);

        Ok(())
    }

    #[test]
    fn sprites_grouped_by_zone() -> Result<()> {
        let loaded = load_course(&save_course(&sample())?)?;

        let sprites: Vec<(u16, u16, u8)> = loaded
            .sprites
            .iter()
            .map(|s| (s.kind, s.x, s.zone))
            .collect();
        assert_eq!(sprites, vec![(52, 0x10, 0), (20, 0x20, 0), (20, 0x500, 1)]);
        assert_eq!(loaded.entrances[0].zone, 1);
        assert_eq!(loaded.loaded_sprite_kinds(), vec![20, 52]);

        Ok(())
    }

    #[test]
    fn block_layout() -> Result<()> {
        let mut course = sample();
        course.metadata.set_binary("x", vec![1]);

        let data = save_course(&course)?;
        let metadata_len = course.metadata.serialize().len().next_multiple_of(4);
        let mut expected_offset = BLOCK_TABLE_SIZE + metadata_len;
        let mut total = 0;
        for index in 0..14 {
            let (offset, length) = block_entry(&data, index);
            assert_eq!(offset, expected_offset);
            expected_offset += length;
            total += length;
        }
        assert_eq!(data.len(), BLOCK_TABLE_SIZE + metadata_len + total);

        // sprites plus terminator, then one entry per distinct kind
        assert_eq!(block_entry(&data, 7).1, 3 * 16 + 4);
        assert_eq!(block_entry(&data, 8).1, 2 * 4);

        Ok(())
    }

    #[test]
    fn zero_length_block() -> Result<()> {
        let data = save_course(&AreaRecordSet::default())?;
        let (_, length) = block_entry(&data, 9);
        assert_eq!(length, 0);

        let loaded = load_course(&data)?;
        assert!(loaded.zones.is_empty());
        assert!(loaded.sprites.is_empty());

        Ok(())
    }

    #[test]
    fn short_single_block_uses_defaults() -> Result<()> {
        let mut data = save_course(&AreaRecordSet::default())?;
        // shrink the options block to nothing
        data[12..16].copy_from_slice(&[0, 0, 0, 0]);

        let loaded = load_course(&data)?;
        assert_eq!(loaded.options, Options::default());

        Ok(())
    }

    #[test]
    fn truncated_course() {
        assert!(matches!(
            load_course(&[0; 0x40]),
            Err(Error::TruncatedCourse(0x40))
        ));
    }

    #[test]
    fn block_out_of_range() -> Result<()> {
        let mut data = save_course(&AreaRecordSet::default())?;
        data[9 * 8..9 * 8 + 4].copy_from_slice(&0x1000u32.to_be_bytes());
        data[9 * 8 + 4..9 * 8 + 8].copy_from_slice(&24u32.to_be_bytes());

        assert!(matches!(
            load_course(&data),
            Err(Error::BlockOutOfRange {
                block: 9,
                offset: 0x1000,
                length: 24,
                ..
            })
        ));

        Ok(())
    }

    #[test]
    fn bind_zones() -> Result<()> {
        let course = sample();
        assert_eq!(
            course.bind()?,
            vec![
                ZoneBinding {
                    zone: 0,
                    bounding: 1,
                    background_a: 0,
                    background_b: 0,
                },
                ZoneBinding {
                    zone: 1,
                    bounding: 0,
                    background_a: 1,
                    background_b: 1,
                },
            ]
        );
        assert_eq!(course.bounding_for(&course.zones[0]), Some(&course.bounding[1]));
        assert_eq!(course.background_b_for(&course.zones[1]), Some(&course.backgrounds_b[1]));

        Ok(())
    }

    #[test]
    fn bind_unresolved() {
        let mut course = sample();
        course.zones[1].bg_b_id = 9;

        assert!(matches!(
            course.bind(),
            Err(Error::UnresolvedReference {
                zone: 1,
                kind: "background B",
                id: 9
            })
        ));
        assert_eq!(course.background_b_for(&course.zones[1]), None);
    }

    #[test]
    fn path_nodes() {
        let course = sample();
        let nodes: Vec<u16> = course.nodes_for(&course.paths[0]).iter().map(|n| n.x).collect();
        assert_eq!(nodes, vec![2, 3]);
        assert!(course.paths[0].is_loop());

        let past_end = Path {
            start_node: 2,
            node_count: 5,
            ..Default::default()
        };
        assert_eq!(course.nodes_for(&past_end).len(), 1);
    }
}
