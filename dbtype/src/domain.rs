use crate::type_id::TypeId;

/// Character-set width class, used by `NCHAR` padding (§4.2: "the
/// codeset-specific space character, 1 or 2 bytes").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codeset {
    SingleByte,
    DoubleByte,
}

impl Codeset {
    pub fn space_width(self) -> usize {
        match self {
            Codeset::SingleByte => 1,
            Codeset::DoubleByte => 2,
        }
    }
}

impl Default for Codeset {
    fn default() -> Self {
        Codeset::SingleByte
    }
}

/// Immutable type descriptor: type id, precision, scale, codeset, sort
/// direction, and (for composite types) a child-domain chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    pub type_id: TypeId,
    pub precision: i32,
    pub scale: i16,
    pub codeset: Codeset,
    pub is_desc: bool,
    pub setdomain: Vec<Domain>,
}

impl Domain {
    pub fn new(type_id: TypeId, precision: i32, scale: i16) -> Self {
        Self {
            type_id,
            precision,
            scale,
            codeset: Codeset::SingleByte,
            is_desc: false,
            setdomain: Vec::new(),
        }
    }

    pub fn fixed(type_id: TypeId) -> Self {
        Self::new(type_id, 0, 0)
    }

    pub fn with_codeset(mut self, codeset: Codeset) -> Self {
        self.codeset = codeset;
        self
    }

    pub fn descending(mut self) -> Self {
        self.is_desc = true;
        self
    }

    pub fn with_setdomain(mut self, children: Vec<Domain>) -> Self {
        self.setdomain = children;
        self
    }
}
