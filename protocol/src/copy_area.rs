use common::err::CResult;
use wire::{Decode, Encode, InputBuffer, Oid, OutputBuffer};

/// One record of a Copy Area's descriptor table (§6): the operation this
/// object crossed the wire for, its OID, its class OID, and where its
/// packed image sits in the content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOperation {
    Fetch,
    Insert,
    Update,
    Delete,
    Flush,
}

impl CopyOperation {
    fn to_wire(self) -> i32 {
        match self {
            CopyOperation::Fetch => 0,
            CopyOperation::Insert => 1,
            CopyOperation::Update => 2,
            CopyOperation::Delete => 3,
            CopyOperation::Flush => 4,
        }
    }

    fn from_wire(v: i32) -> CopyOperation {
        match v {
            1 => CopyOperation::Insert,
            2 => CopyOperation::Update,
            3 => CopyOperation::Delete,
            4 => CopyOperation::Flush,
            _ => CopyOperation::Fetch,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CopyDescriptor {
    pub operation: CopyOperation,
    pub oid: Oid,
    pub class_oid: Oid,
    pub length: i32,
    pub offset: i32,
}

/// Bulk carrier for packed objects crossing the client/server boundary
/// (§3, §6): a descriptor table plus a concatenated content block, used
/// by `locator_fetch`/`locator_force`.
#[derive(Debug, Clone)]
pub struct CopyArea {
    pub class_oid: Oid,
    pub start_multi_update: i32,
    pub end_multi_update: i32,
    pub descriptors: Vec<CopyDescriptor>,
    pub content: Vec<u8>,
}

impl CopyArea {
    pub fn new(class_oid: Oid) -> Self {
        Self {
            class_oid,
            start_multi_update: 0,
            end_multi_update: 0,
            descriptors: Vec::new(),
            content: Vec::new(),
        }
    }

    /// Appends a packed object image, recording its descriptor with the
    /// offset it landed at in the content block.
    pub fn push(&mut self, operation: CopyOperation, oid: Oid, class_oid: Oid, image: &[u8]) {
        let offset = self.content.len() as i32;
        self.descriptors.push(CopyDescriptor {
            operation,
            oid,
            class_oid,
            length: image.len() as i32,
            offset,
        });
        self.content.extend_from_slice(image);
    }

    pub fn num_objs(&self) -> usize {
        self.descriptors.len()
    }

    /// Slices out the packed image for descriptor `i`.
    pub fn image(&self, i: usize) -> &[u8] {
        let d = &self.descriptors[i];
        let start = d.offset as usize;
        let end = start + d.length as usize;
        &self.content[start..end]
    }
}

impl Encode for CopyArea {
    fn encode(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.put_i32(self.num_objs() as i32)?;
        buf.put_i32(self.start_multi_update)?;
        buf.put_i32(self.end_multi_update)?;
        self.class_oid.encode(buf)?;
        buf.put_i32(self.descriptors.len() as i32 * (4 + Oid::WIDTH as i32 * 2 + 4 + 4))?;
        buf.put_i32(self.content.len() as i32)?;
        for d in &self.descriptors {
            buf.put_i32(d.operation.to_wire())?;
            d.oid.encode(buf)?;
            d.class_oid.encode(buf)?;
            buf.put_i32(d.length)?;
            buf.put_i32(d.offset)?;
        }
        buf.put_bytes(&self.content)
    }
}

impl Decode for CopyArea {
    fn decode(buf: &mut InputBuffer) -> CResult<Self> {
        let num_objs = buf.get_i32()?.max(0) as usize;
        let start_multi_update = buf.get_i32()?;
        let end_multi_update = buf.get_i32()?;
        let class_oid = Oid::decode(buf)?;
        let _desc_size = buf.get_i32()?;
        let content_size = buf.get_i32()?.max(0) as usize;

        let mut descriptors = Vec::with_capacity(num_objs);
        for _ in 0..num_objs {
            let operation = CopyOperation::from_wire(buf.get_i32()?);
            let oid = Oid::decode(buf)?;
            let obj_class_oid = Oid::decode(buf)?;
            let length = buf.get_i32()?;
            let offset = buf.get_i32()?;
            descriptors.push(CopyDescriptor {
                operation,
                oid,
                class_oid: obj_class_oid,
                length,
                offset,
            });
        }
        let content = buf.get_bytes(content_size)?.to_vec();

        Ok(Self {
            class_oid,
            start_multi_update,
            end_multi_update,
            descriptors,
            content,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roundtrips_two_descriptors() {
        let mut area = CopyArea::new(Oid::new(1, 1, 1));
        area.push(CopyOperation::Insert, Oid::new(0, 0, 0), Oid::new(1, 1, 1), b"abc");
        area.push(CopyOperation::Insert, Oid::new(0, 0, 0), Oid::new(1, 1, 1), b"de");

        let mut out = OutputBuffer::with_capacity(256);
        area.encode(&mut out).unwrap();
        let mut input = InputBuffer::new(out.as_slice());
        let back = CopyArea::decode(&mut input).unwrap();

        assert_eq!(back.num_objs(), 2);
        assert_eq!(back.image(0), b"abc");
        assert_eq!(back.image(1), b"de");
    }
}
