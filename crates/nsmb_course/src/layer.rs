//! Object layers, stored as `course/courseN_bgdatL{0,1,2}.bin`
//!
//! | Field          | Size    | Description                          |
//! |----------------|---------|--------------------------------------|
//! | Tileset / kind | 2 bytes | Tileset in the top 4 bits, then kind |
//! | X              | 2 bytes | Position in tiles                    |
//! | Y              | 2 bytes | Position in tiles                    |
//! | Width          | 2 bytes | Size in tiles                        |
//! | Height         | 2 bytes | Size in tiles                        |
//!
//! Objects are big-endian and the list ends with `0xFFFF`. Objects earlier in the file are drawn
//! below later ones, and layer 0 is drawn above layer 1, which is above layer 2.

use byteorder::{BigEndian, ByteOrder};
use derive_more::{Deref, IntoIterator};
use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of object layers per area
pub const LAYER_COUNT: usize = 3;

/// Size of one object on disk
pub const OBJECT_SIZE: usize = 10;

/// Depth range reserved for each layer
pub const Z_STRIDE: u32 = 8192;

const TERMINATOR: u16 = 0xFFFF;

/// A rectangle of tiles from one tileset
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LevelObject {
    /// Tileset slot, `0..=3`
    pub tileset: u8,

    /// Object kind within the tileset, 12 bits
    pub kind: u16,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,

    /// Drawing depth, higher is drawn first
    pub z: u32,
}

impl LevelObject {
    pub fn new(tileset: u8, kind: u16, x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            tileset,
            kind,
            x,
            y,
            width,
            height,
            z: 0,
        }
    }

    fn decode(raw: &[u8]) -> Self {
        let packed = BigEndian::read_u16(&raw[0..2]);
        Self::new(
            (packed >> 12) as u8,
            packed & 0x0FFF,
            BigEndian::read_u16(&raw[2..4]),
            BigEndian::read_u16(&raw[4..6]),
            BigEndian::read_u16(&raw[6..8]),
            BigEndian::read_u16(&raw[8..10]),
        )
    }

    fn encode(&self) -> [u8; OBJECT_SIZE] {
        let mut raw = [0; OBJECT_SIZE];
        let packed = (self.tileset as u16 & 0xF) << 12 | self.kind & 0x0FFF;
        BigEndian::write_u16(&mut raw[0..2], packed);
        BigEndian::write_u16(&mut raw[2..4], self.x);
        BigEndian::write_u16(&mut raw[4..6], self.y);
        BigEndian::write_u16(&mut raw[6..8], self.width);
        BigEndian::write_u16(&mut raw[8..10], self.height);
        raw
    }
}

/// Ordered objects of one layer
///
/// The position of an object in the list is its drawing order, and its `z` is kept equal to
/// `(2 - layer) * 8192 + position` by every method that changes the list.
#[derive(Debug, Clone, PartialEq, Eq, Deref, IntoIterator)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectLayer {
    index: usize,

    #[deref]
    #[into_iterator(owned, ref)]
    objects: Vec<LevelObject>,
}

impl ObjectLayer {
    /// Creates an empty layer, fails for indices above 2
    pub fn new(index: usize) -> Result<Self> {
        if index >= LAYER_COUNT {
            return Err(Error::InvalidLayer(index));
        }
        Ok(Self::empty(index))
    }

    pub(crate) fn empty(index: usize) -> Self {
        Self {
            index,
            objects: Vec::new(),
        }
    }

    /// Empty layers 0, 1 and 2
    pub fn all() -> [ObjectLayer; LAYER_COUNT] {
        [0, 1, 2].map(Self::empty)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Depth of the first object in this layer
    pub fn base_z(&self) -> u32 {
        (LAYER_COUNT - 1 - self.index) as u32 * Z_STRIDE
    }

    /// Add an object on top of the layer
    pub fn push(&mut self, mut object: LevelObject) {
        object.z = self.base_z() + self.objects.len() as u32;
        self.objects.push(object);
    }

    /// Insert an object at `position`, clamped to the end of the layer
    pub fn insert(&mut self, position: usize, object: LevelObject) {
        let position = position.min(self.objects.len());
        self.objects.insert(position, object);
        self.renumber();
    }

    /// Remove the object at `position`
    pub fn remove(&mut self, position: usize) -> Option<LevelObject> {
        if position >= self.objects.len() {
            return None;
        }
        let object = self.objects.remove(position);
        self.renumber();
        Some(object)
    }

    /// Mutable access to an object, its `z` is restored by the next [`ObjectLayer::renumber`]
    pub fn get_mut(&mut self, position: usize) -> Option<&mut LevelObject> {
        self.objects.get_mut(position)
    }

    /// Reassign every `z` from the list order
    pub fn renumber(&mut self) {
        let base = self.base_z();
        for (i, object) in self.objects.iter_mut().enumerate() {
            object.z = base + i as u32;
        }
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }
}

/// Decode layer `index` from its file, `None` is an empty layer
///
/// Decoding stops at the terminator or at the last complete object.
pub fn load_layer(index: usize, data: Option<&[u8]>) -> Result<ObjectLayer> {
    let mut layer = ObjectLayer::new(index)?;

    for raw in data.unwrap_or_default().chunks_exact(OBJECT_SIZE) {
        if BigEndian::read_u16(&raw[0..2]) == TERMINATOR {
            break;
        }
        layer.push(LevelObject::decode(raw));
    }

    trace!(index, objects = layer.len(), "loaded layer");
    Ok(layer)
}

/// Encode a layer, terminator included
pub fn save_layer(layer: &ObjectLayer) -> Vec<u8> {
    let mut out = Vec::with_capacity(layer.len() * OBJECT_SIZE + 2);
    for object in layer {
        out.extend_from_slice(&object.encode());
    }
    out.extend_from_slice(&TERMINATOR.to_be_bytes());
    out
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::layer::{load_layer, save_layer, LevelObject, ObjectLayer};

    #[rustfmt::skip]
    const TWO_OBJECTS: [u8; 22] = [
        0x10, 0x05, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00, 0x01,
        0x00, 0x3C, 0x00, 0x10, 0x00, 0x20, 0x00, 0x01, 0x00, 0x08,
        0xFF, 0xFF,
    ];

    #[test]
    fn load_objects() -> Result<()> {
        let layer = load_layer(1, Some(&TWO_OBJECTS))?;

        assert_eq!(layer.index(), 1);
        assert_eq!(
            layer.to_vec(),
            vec![
                LevelObject {
                    z: 8192,
                    ..LevelObject::new(1, 5, 2, 3, 4, 1)
                },
                LevelObject {
                    z: 8193,
                    ..LevelObject::new(0, 0x3C, 0x10, 0x20, 1, 8)
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn save_objects() -> Result<()> {
        let layer = load_layer(0, Some(&TWO_OBJECTS))?;
        assert_eq!(save_layer(&layer), TWO_OBJECTS.to_vec());

        Ok(())
    }

    #[test]
    fn missing_terminator() -> Result<()> {
        let layer = load_layer(0, Some(&TWO_OBJECTS[..15]))?;
        assert_eq!(layer.len(), 1);

        Ok(())
    }

    #[test]
    fn empty_layers() -> Result<()> {
        assert!(load_layer(2, None)?.is_empty());
        assert!(load_layer(2, Some(&[0xFF, 0xFF]))?.is_empty());
        assert_eq!(save_layer(&ObjectLayer::new(2)?), vec![0xFF, 0xFF]);

        Ok(())
    }

    #[test]
    fn invalid_index() {
        assert!(matches!(load_layer(3, None), Err(Error::InvalidLayer(3))));
        assert!(matches!(ObjectLayer::new(7), Err(Error::InvalidLayer(7))));
    }

    #[test]
    fn edits_keep_depth() -> Result<()> {
        let mut layer = ObjectLayer::new(2)?;
        layer.push(LevelObject::new(0, 1, 0, 0, 1, 1));
        layer.push(LevelObject::new(0, 2, 0, 0, 1, 1));
        layer.insert(0, LevelObject::new(0, 3, 0, 0, 1, 1));
        layer.insert(10, LevelObject::new(0, 4, 0, 0, 1, 1));

        let kinds: Vec<(u16, u32)> = layer.iter().map(|o| (o.kind, o.z)).collect();
        assert_eq!(kinds, vec![(3, 0), (1, 1), (2, 2), (4, 3)]);

        assert_eq!(layer.remove(1).map(|o| o.kind), Some(1));
        assert_eq!(layer.remove(9), None);
        let depths: Vec<u32> = layer.iter().map(|o| o.z).collect();
        assert_eq!(depths, vec![0, 1, 2]);

        Ok(())
    }

    #[test]
    fn tileset_is_masked() -> Result<()> {
        let mut layer = ObjectLayer::new(0)?;
        layer.push(LevelObject::new(3, 0xFFF, 1, 2, 3, 4));

        let encoded = save_layer(&layer);
        assert_eq!(&encoded[..2], &[0x3F, 0xFF]);
        assert_eq!(load_layer(0, Some(&encoded))?.to_vec(), layer.to_vec());

        Ok(())
    }
}
