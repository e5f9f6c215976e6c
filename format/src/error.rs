//! Model format errors

/// Failure to accept a byte buffer as a model resource.
///
/// Header checks run in a fixed order (length, signature, version, declared
/// size), so a buffer with several problems always reports the first one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    #[error("Model data is {actual} bytes, smaller than the {minimum}-byte header")]
    Truncated { actual: usize, minimum: usize },

    #[error("Malformed model: signature {found:?} is not \"riomodel\"")]
    MalformedFormat { found: [u8; 8] },

    #[error("Unsupported model version {found:#010x} (supported: {min:#010x}..={max:#010x})")]
    UnsupportedVersion { found: u32, min: u32, max: u32 },

    #[error("Model declares {declared} bytes but {actual} bytes were supplied")]
    SizeMismatch { declared: u32, actual: usize },

    #[error("Corrupt model: {0}")]
    CorruptAsset(#[from] Corruption),
}

/// An index or view inside an otherwise well-formed model that cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Corruption {
    #[error("{what} view at {field:#x} has {count} elements but a null offset")]
    NullView {
        what: &'static str,
        field: usize,
        count: u32,
    },

    #[error("{what} view [{start}, +{len}) lies outside the {file_len}-byte buffer")]
    ViewOutOfBounds {
        what: &'static str,
        start: i64,
        len: u64,
        file_len: usize,
    },

    #[error("{what} view starts at {start:#x}, not aligned to {align}")]
    MisalignedView {
        what: &'static str,
        start: usize,
        align: usize,
    },

    #[error("{what} string at {start:#x} is not NUL-terminated")]
    UnterminatedString { what: &'static str, start: usize },

    #[error("{what} string at {start:#x} is not valid UTF-8")]
    InvalidString { what: &'static str, start: usize },

    #[error("{what} stream has {count} entries for {vertices} vertices")]
    BlendStreamLength {
        what: &'static str,
        count: usize,
        vertices: usize,
    },

    #[error("vertex {vertex} is weighted to mesh bone {index}, but the mesh has {count}")]
    BlendIndexOutOfRange {
        vertex: usize,
        index: u32,
        count: usize,
    },

    #[error("mesh {mesh} references material {index}, but only {count} exist")]
    MaterialIndexOutOfRange { mesh: usize, index: u32, count: usize },

    #[error("skeleton root index {index} is out of range for {count} bones")]
    RootIndexOutOfRange { index: i32, count: usize },

    #[error("bone {bone} has parent index {index}, but only {count} bones exist")]
    ParentIndexOutOfRange { bone: usize, index: i32, count: usize },

    #[error("bone {bone} lists child index {index}, but only {count} bones exist")]
    ChildIndexOutOfRange { bone: usize, index: i32, count: usize },

    #[error("bone {bone} lists child {child} whose parent index disagrees")]
    InconsistentHierarchy { bone: usize, child: usize },

    #[error("bone {bone} is part of a parent cycle")]
    HierarchyCycle { bone: usize },

    #[error("mesh {mesh} bone {slot} references skeleton bone {index}, but only {count} exist")]
    MeshBoneOutOfRange {
        mesh: usize,
        slot: usize,
        index: u32,
        count: usize,
    },

    #[error("animation {animation} targets bone {index}, but only {count} bones exist")]
    AnimationBoneOutOfRange {
        animation: usize,
        index: u32,
        count: usize,
    },
}
