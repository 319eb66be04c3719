use bitflags::bitflags;

use crate::bus::BusDevice;

pub const OAM_BASE: u16 = 0xFE00;
pub const OAM_LAST: u16 = 0xFE9F;
pub const OAM_SIZE: usize = 0xA0;

/// Number of object descriptors in OAM.
pub const OBJECT_COUNT: usize = 40;
/// Bytes per object descriptor.
pub const OBJECT_SIZE: usize = 4;
/// Hardware limit of objects selected per scanline.
pub const MAX_OBJECTS_PER_LINE: usize = 10;

// Y is stored offset so that a 16-line object can slide in from the top.
pub const OBJECT_Y_INDENT: i16 = 16;

pub const NORMAL_OBJECT_HEIGHT: u8 = 8;
pub const LARGE_OBJECT_HEIGHT: u8 = 16;

bitflags! {
    /// Object attribute byte (descriptor byte 3).
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// P Y X D B c c c
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectAttributes: u8 {
        /// Background colours 1-3 draw over the object.
        const BG_PRIORITY = 0b1000_0000;
        const Y_FLIP = 0b0100_0000;
        const X_FLIP = 0b0010_0000;
        /// OBP1 instead of OBP0 (monochrome modes).
        const DMG_PALETTE = 0b0001_0000;
        /// Tile data from VRAM bank 1 (CGB).
        const VRAM_BANK = 0b0000_1000;
        /// CGB object palette number.
        const CGB_PALETTE = 0b0000_0111;
    }
}

/// One OAM entry, decoded field by field from its four bytes.
///
/// The in-memory layout is Y first: Y, X, tile index, attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub y: u8,
    pub x: u8,
    pub tile_index: u8,
    pub attributes: u8,
}

impl ObjectDescriptor {
    pub const fn new(y: u8, x: u8, tile_index: u8, attributes: u8) -> Self {
        Self {
            y,
            x,
            tile_index,
            attributes,
        }
    }

    /// Decode descriptor `index` from a raw OAM image.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`OBJECT_COUNT`].
    pub fn decode(oam: &[u8; OAM_SIZE], index: usize) -> Self {
        assert!(index < OBJECT_COUNT, "object index {index} out of range");
        let base = index * OBJECT_SIZE;
        Self {
            y: oam[base],
            x: oam[base + 1],
            tile_index: oam[base + 2],
            attributes: oam[base + 3],
        }
    }

    pub fn encode(&self) -> [u8; OBJECT_SIZE] {
        [self.y, self.x, self.tile_index, self.attributes]
    }

    pub fn flags(&self) -> ObjectAttributes {
        ObjectAttributes::from_bits_retain(self.attributes)
    }

    /// Whether scanline `line` crosses this object for the given height.
    #[inline]
    pub fn intersects(&self, line: u8, height: u8) -> bool {
        let top = self.y as i16 - OBJECT_Y_INDENT;
        let line = line as i16;
        line >= top && line < top + height as i16
    }
}

/// Object attribute memory. The picture unit only reads it.
pub struct ObjectAttributeMemory {
    bytes: [u8; OAM_SIZE],
}

impl ObjectAttributeMemory {
    pub fn new() -> Self {
        Self {
            bytes: [0; OAM_SIZE],
        }
    }

    pub fn descriptor(&self, index: usize) -> ObjectDescriptor {
        ObjectDescriptor::decode(&self.bytes, index)
    }

    pub fn set_descriptor(&mut self, index: usize, descriptor: ObjectDescriptor) {
        assert!(index < OBJECT_COUNT, "object index {index} out of range");
        let base = index * OBJECT_SIZE;
        self.bytes[base..base + OBJECT_SIZE].copy_from_slice(&descriptor.encode());
    }
}

impl Default for ObjectAttributeMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl BusDevice for ObjectAttributeMemory {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            OAM_BASE..=OAM_LAST => self.bytes[(addr - OAM_BASE) as usize],
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        if let OAM_BASE..=OAM_LAST = addr {
            self.bytes[(addr - OAM_BASE) as usize] = value;
        }
    }
}

/// Draw priority policy for the intersected-object list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectPriority {
    /// Discovery order (CGB).
    OamIndex,
    /// Ascending X, ties broken by OAM index (monochrome modes).
    Coordinate,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntersectedObject {
    pub oam_index: u8,
    pub descriptor: ObjectDescriptor,
}

impl IntersectedObject {
    fn coordinate_key(&self) -> (u8, u8) {
        (self.descriptor.x, self.oam_index)
    }
}

/// Objects selected for the current scanline, in draw priority order.
#[derive(Clone, Debug, Default)]
pub struct IntersectedObjects {
    entries: [IntersectedObject; MAX_OBJECTS_PER_LINE],
    len: usize,
}

impl IntersectedObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == MAX_OBJECTS_PER_LINE
    }

    pub fn as_slice(&self) -> &[IntersectedObject] {
        &self.entries[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = &IntersectedObject> {
        self.as_slice().iter()
    }

    /// Evaluate one descriptor for `line`. Returns whether it was added.
    ///
    /// Nothing is added once ten objects are held, whether or not the
    /// descriptor intersects.
    pub fn consider(
        &mut self,
        line: u8,
        height: u8,
        oam_index: u8,
        descriptor: ObjectDescriptor,
        priority: ObjectPriority,
    ) -> bool {
        if self.is_full() || !descriptor.intersects(line, height) {
            return false;
        }
        let object = IntersectedObject {
            oam_index,
            descriptor,
        };
        let at = match priority {
            ObjectPriority::OamIndex => self.len,
            ObjectPriority::Coordinate => {
                let key = object.coordinate_key();
                self.as_slice()
                    .iter()
                    .position(|e| e.coordinate_key() > key)
                    .unwrap_or(self.len)
            }
        };
        self.entries.copy_within(at..self.len, at + 1);
        self.entries[at] = object;
        self.len += 1;
        true
    }
}
