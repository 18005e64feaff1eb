//! Fixed size records stored in the blocks of a course file
//!
//! All records are big-endian and their sizes are exact, padding included.

use binrw::{BinRead, BinWrite};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::metadata::decode_latin1;

/// Length of every tileset name slot
pub const TILESET_NAME_LEN: usize = 32;

/// Sizes of the records making up a block
pub trait Record {
    /// Size of one record in bytes
    const SIZE: usize;
}

macro_rules! record_size {
    ($($ty:ty => $size:expr),* $(,)?) => {
        $(
            impl Record for $ty {
                const SIZE: usize = $size;
            }
        )*
    };
}

record_size! {
    BlockEntry => 8,
    Tilesets => 128,
    RawOptions => 20,
    ExtraOptions => 8,
    BoundingBox => 24,
    Background => 24,
    Entrance => 20,
    Sprite => 16,
    LoadedSprite => 4,
    Zone => 24,
    Location => 12,
    Path => 8,
    PathNode => 16,
}

/// One entry of the block table at the start of a course
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(big)]
pub struct BlockEntry {
    /// Offset of the block from the start of the course
    pub offset: u32,

    /// Length of the block
    pub length: u32,
}

fn decode_name(raw: &[u8; TILESET_NAME_LEN]) -> String {
    let end = raw.iter().position(|c| *c == 0).unwrap_or(raw.len());
    decode_latin1(&raw[..end])
}

fn encode_name(name: &str) -> [u8; TILESET_NAME_LEN] {
    let mut raw = [0; TILESET_NAME_LEN];
    for (slot, c) in raw.iter_mut().zip(name.chars()) {
        *slot = u8::try_from(c).unwrap_or(b'?');
    }
    raw
}

/// Names of the four tilesets used by an area, block 0
///
/// Empty names mean the slot is unused.
#[derive(BinRead, BinWrite, Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[brw(big)]
pub struct Tilesets {
    /// Tileset names, at most 32 single byte characters each
    #[br(map = |raw: [[u8; TILESET_NAME_LEN]; 4]| raw.map(|name| decode_name(&name)))]
    #[bw(map = |names: &[String; 4]| names.clone().map(|name| encode_name(&name)))]
    pub names: [String; 4],
}

/// Block 1 as stored on disk
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(big)]
pub(crate) struct RawOptions {
    events_low: u32,
    events_high: u32,
    flags: u16,
    time_limit: i16,
    credits: u8,
    unk: u8,
    start_entrance: u8,
    ambush: u8,
    #[brw(pad_after = 3)]
    toad_house_type: u8,
}

/// General options of an area, block 1
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Options {
    /// Events active when the area loads, one bit per event
    pub def_events: u64,

    /// Whether the area wraps around horizontally
    pub wrap: bool,

    /// Unknown flag stored in bit 3 of the flag field
    pub unk_flag1: bool,

    /// Unknown flag, stored as 100 when set
    pub unk_flag2: bool,

    /// Time limit in seconds
    pub time_limit: i16,

    /// Whether this is the credits level
    pub credits: bool,

    /// Id of the entrance the player starts at
    pub start_entrance: u8,

    /// Whether this is an ambush level
    pub ambush: bool,

    /// Kind of toad house
    pub toad_house_type: u8,
}

impl From<RawOptions> for Options {
    fn from(raw: RawOptions) -> Self {
        Self {
            def_events: (raw.events_high as u64) << 32 | raw.events_low as u64,
            wrap: raw.flags & 0x1 != 0,
            unk_flag1: raw.flags & 0x8 != 0,
            unk_flag2: raw.unk == 100,
            time_limit: raw.time_limit,
            credits: raw.credits != 0,
            start_entrance: raw.start_entrance,
            ambush: raw.ambush != 0,
            toad_house_type: raw.toad_house_type,
        }
    }
}

impl From<&Options> for RawOptions {
    fn from(options: &Options) -> Self {
        Self {
            events_low: options.def_events as u32,
            events_high: (options.def_events >> 32) as u32,
            flags: options.wrap as u16 | (options.unk_flag1 as u16) << 3,
            time_limit: options.time_limit,
            credits: options.credits as u8,
            unk: if options.unk_flag2 { 100 } else { 0 },
            start_entrance: options.start_entrance,
            ambush: options.ambush as u8,
            toad_house_type: options.toad_house_type,
        }
    }
}

/// Second set of area options, block 3
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[brw(big)]
pub struct ExtraOptions {
    pub unk1: u16,
    #[brw(pad_after = 4)]
    pub unk2: u16,
}

/// Camera bounds of a zone, block 2
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[brw(big)]
pub struct BoundingBox {
    pub upper: i32,
    pub lower: i32,
    pub lakitu_upper: i32,
    pub lakitu_lower: i32,

    /// Id zones use to refer to this box
    pub id: u16,
    pub cam_zoom_adjust: u16,
    pub unk1: i16,
    pub unk2: i16,
}

/// Background layer settings, blocks 4 and 5
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[brw(big)]
pub struct Background {
    /// Id zones use to refer to this background
    pub id: u16,
    pub x_scroll: i16,
    pub y_scroll: i16,
    pub y_pos: i16,
    pub x_pos: i16,

    /// Background images, drawn back to front
    #[brw(pad_after = 3)]
    pub images: [u16; 3],
    #[brw(pad_after = 4)]
    pub zoom: u8,
}

/// Entrance or exit, block 6
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[brw(big)]
pub struct Entrance {
    pub x: i16,
    #[brw(pad_after = 4)]
    pub y: i16,
    pub id: u8,
    pub dest_area: u8,
    pub dest_entrance: u8,
    #[brw(pad_after = 1)]
    pub kind: u8,

    /// Zone the entrance lies in, recomputed on save
    pub zone: u8,
    pub layer: u8,
    pub path: u8,
    pub settings: u16,
    pub unk: u8,
    pub direction: u8,
}

/// Sprite placement, block 7
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[brw(big)]
pub struct Sprite {
    pub kind: u16,
    pub x: u16,
    pub y: u16,

    /// Settings whose meaning depends on the sprite kind
    pub data: [u8; 6],

    /// Zone the sprite lies in, recomputed on save
    pub zone: u8,
    #[brw(pad_after = 2)]
    pub extra: u8,
}

/// Marks the end of the sprite block
pub const SPRITE_TERMINATOR: [u8; 4] = [0xFF; 4];

/// Sprite kind the game has to load for an area, block 8
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(big)]
pub struct LoadedSprite {
    #[brw(pad_after = 2)]
    pub kind: u16,
}

/// Zone, block 9
///
/// Positions and sizes use the same units as sprite and entrance positions.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[brw(big)]
pub struct Zone {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub model_shading: u16,
    pub terrain_shading: u16,
    pub id: u8,

    /// Id of the [`BoundingBox`] used by this zone
    pub bounding_id: u8,
    pub cam_mode: u8,
    #[brw(pad_after = 1)]
    pub cam_zoom: u8,
    pub visibility: u8,

    /// Id of the [`Background`] from block 4
    pub bg_a_id: u8,

    /// Id of the [`Background`] from block 5
    pub bg_b_id: u8,
    #[brw(pad_after = 1)]
    pub cam_track: u8,
    pub music: u8,
    pub sfx_mod: u8,
}

/// Rectangular location used by sprites and events, block 10
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[brw(big)]
pub struct Location {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    #[brw(pad_after = 3)]
    pub id: u8,
}

/// Path followed by moving sprites, block 12
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[brw(big)]
pub struct Path {
    #[brw(pad_after = 1)]
    pub id: u8,

    /// Index of the first node in block 13
    pub start_node: u16,
    pub node_count: u16,

    /// `2` for paths that loop back to their start
    pub loop_flag: u16,
}

impl Path {
    /// Whether the path loops back to its first node
    pub fn is_loop(&self) -> bool {
        self.loop_flag == 2
    }
}

/// Point on a path, block 13
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[brw(big)]
pub struct PathNode {
    pub x: u16,
    pub y: u16,
    pub speed: f32,
    pub accel: f32,
    #[brw(pad_after = 2)]
    pub delay: i16,
}

#[cfg(test)]
mod test {
    use binrw::{BinRead, BinWrite};
    use pretty_assertions::{assert_eq, assert_str_eq};
    use std::io::Cursor;

    use crate::error::Result;
    use crate::types::*;

    fn write<T: for<'a> BinWrite<Args<'a> = ()> + binrw::meta::WriteEndian>(
        value: &T,
    ) -> Result<Vec<u8>> {
        let mut writer = Cursor::new(Vec::new());
        value.write(&mut writer)?;
        Ok(writer.into_inner())
    }

    #[test]
    fn tileset_names() -> Result<()> {
        let mut input = vec![0u8; Tilesets::SIZE];
        input[..10].copy_from_slice(b"Pa0_jyotyu");
        input[64..74].copy_from_slice(b"Pa2_sora_0");

        let tilesets = Tilesets::read(&mut Cursor::new(&input))?;
        assert_eq!(
            tilesets.names,
            [
                "Pa0_jyotyu".to_string(),
                String::new(),
                "Pa2_sora_0".to_string(),
                String::new()
            ]
        );
        assert_eq!(write(&tilesets)?, input);

        Ok(())
    }

    #[test]
    fn options_flags() -> Result<()> {
        #[rustfmt::skip]
        let input = vec![
            0x00, 0x00, 0x00, 0x02, // events, low half
            0x80, 0x00, 0x00, 0x00, // events, high half
            0x00, 0x09,             // wrap and unk_flag1
            0x01, 0x2C,             // time limit
            0x00,                   // credits
            0x64,                   // unk_flag2
            0x03,                   // start entrance
            0x01,                   // ambush
            0x02,                   // toad house
            0x00, 0x00, 0x00,
        ];

        let raw = RawOptions::read(&mut Cursor::new(&input))?;
        let options = Options::from(raw);
        assert_eq!(
            options,
            Options {
                def_events: 0x8000_0000_0000_0002,
                wrap: true,
                unk_flag1: true,
                unk_flag2: true,
                time_limit: 300,
                credits: false,
                start_entrance: 3,
                ambush: true,
                toad_house_type: 2,
            }
        );
        assert_eq!(write(&RawOptions::from(&options))?, input);

        Ok(())
    }

    #[test]
    fn read_zone() -> Result<()> {
        #[rustfmt::skip]
        let input = vec![
            0x01, 0x00, 0x00, 0x40, 0x02, 0x00, 0x01, 0x80, // x, y, width, height
            0x00, 0x00, 0x00, 0x01,                         // shading
            0x00, 0x00, 0x02, 0x00, 0x00,                   // id, bounding, camera, pad
            0x10, 0x03, 0x04, 0x00, 0x00,                   // visibility, bg a, bg b, track, pad
            0x05, 0x00,                                     // music, sfx
        ];

        let zone = Zone::read(&mut Cursor::new(&input))?;
        assert_eq!(zone.x, 0x100);
        assert_eq!(zone.height, 0x180);
        assert_eq!(zone.terrain_shading, 1);
        assert_eq!(zone.cam_mode, 2);
        assert_eq!(zone.visibility, 0x10);
        assert_eq!(zone.bg_a_id, 3);
        assert_eq!(zone.bg_b_id, 4);
        assert_eq!(zone.music, 5);
        assert_eq!(write(&zone)?, input);

        Ok(())
    }

    #[test]
    fn write_entrance() -> Result<()> {
        #[rustfmt::skip]
        let expected = vec![
            0x00, 0x20, 0xFF, 0xF0,     // x, y
            0x00, 0x00, 0x00, 0x00,
            0x01, 0x02, 0x03, 0x14,     // id, destination area and entrance, kind
            0x00,
            0x00, 0x01, 0x02,           // zone, layer, path
            0x00, 0x80,                 // settings
            0x00, 0x03,                 // unk, direction
        ];

        let entrance = Entrance {
            x: 0x20,
            y: -0x10,
            id: 1,
            dest_area: 2,
            dest_entrance: 3,
            kind: 20,
            zone: 0,
            layer: 1,
            path: 2,
            settings: 0x80,
            unk: 0,
            direction: 3,
        };
        let result = write(&entrance)?;
        assert_eq!(result.len(), Entrance::SIZE);
        assert_str_eq!(format!("{:02X?}", result), format!("{:02X?}", expected));

        Ok(())
    }

    #[test]
    fn write_sprite() -> Result<()> {
        #[rustfmt::skip]
        let expected = vec![
            0x00, 0x14, 0x01, 0x00, 0x00, 0x80,     // kind, x, y
            0x10, 0x00, 0x00, 0x00, 0x00, 0x01,     // data
            0x02, 0x00,                             // zone, extra
            0x00, 0x00,
        ];

        let sprite = Sprite {
            kind: 20,
            x: 0x100,
            y: 0x80,
            data: [0x10, 0, 0, 0, 0, 1],
            zone: 2,
            extra: 0,
        };
        assert_eq!(write(&sprite)?, expected);

        Ok(())
    }

    #[test]
    fn record_sizes() -> Result<()> {
        assert_eq!(write(&Background::default())?.len(), Background::SIZE);
        assert_eq!(write(&BoundingBox::default())?.len(), BoundingBox::SIZE);
        assert_eq!(write(&ExtraOptions::default())?.len(), ExtraOptions::SIZE);
        assert_eq!(write(&LoadedSprite::default())?.len(), LoadedSprite::SIZE);
        assert_eq!(write(&Location::default())?.len(), Location::SIZE);
        assert_eq!(write(&Path::default())?.len(), Path::SIZE);
        assert_eq!(write(&PathNode::default())?.len(), PathNode::SIZE);
        assert_eq!(write(&RawOptions::default())?.len(), RawOptions::SIZE);
        assert_eq!(write(&Zone::default())?.len(), Zone::SIZE);

        Ok(())
    }

    #[test]
    fn path_node_floats() -> Result<()> {
        #[rustfmt::skip]
        let input = vec![
            0x00, 0x10, 0x00, 0x20,
            0x3F, 0x80, 0x00, 0x00, // 1.0
            0x3E, 0x80, 0x00, 0x00, // 0.25
            0x00, 0x05, 0x00, 0x00,
        ];

        let node = PathNode::read(&mut Cursor::new(&input))?;
        assert_eq!(node.speed, 1.0);
        assert_eq!(node.accel, 0.25);
        assert_eq!(node.delay, 5);

        Ok(())
    }
}
