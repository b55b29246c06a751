//! Handle and classification types for the host audio graph.
//!
//! Every handle is an arena index assigned sequentially by the host and never
//! reused within a host instance, so a handle is a stable identity for the
//! lifetime of the thing it names.

/// Identifies a processing context (one audio-graph session).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub(crate) u32);

/// Identifies a node inside some context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

/// Identifies a playback element (the `<audio>`/`<video>` analogue).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) u32);

macro_rules! handle_impls {
    ($($ty:ident),*) => {$(
        impl $ty {
            /// Builds a handle from a raw index.
            ///
            /// Intended for alternative [`AudioGraph`](super::AudioGraph)
            /// implementations that manage their own arenas.
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw numeric identifier.
            #[inline]
            pub const fn index(self) -> u32 {
                self.0
            }
        }

        impl core::fmt::Display for $ty {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}({})", stringify!($ty), self.0)
            }
        }
    )*};
}

handle_impls!(ContextId, NodeId, ElementId);

/// How a source node obtains its audio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Direct attachment of a playback element.
    Element,
    /// A stream captured from a playback element.
    Stream,
    /// A page-owned buffer or generator.
    Buffer,
}

/// The role of a node in a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Produces audio; has no inputs.
    Source(SourceKind),
    /// Frequency-selective filter stage.
    Filter,
    /// Linear gain stage.
    Gain,
    /// The context's real output device. Exactly one per context.
    Destination,
}

impl NodeKind {
    /// Returns `true` for the real output device.
    #[inline]
    pub fn is_destination(self) -> bool {
        matches!(self, NodeKind::Destination)
    }
}

/// Buffered-data level of a playback element, ordered from least to most ready.
///
/// Mirrors the five media readiness levels; splicing waits for
/// [`ReadyState::HaveCurrentData`] or better.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReadyState {
    /// No information about the media.
    HaveNothing,
    /// Duration and dimensions known, no sample data yet.
    HaveMetadata,
    /// Data for the current playback position is available.
    HaveCurrentData,
    /// Data for at least a little ahead of the current position.
    HaveFutureData,
    /// Enough data to play through without stalling.
    HaveEnoughData,
}

impl ReadyState {
    /// Whether the element has buffered enough to be spliced.
    #[inline]
    pub fn is_playable(self) -> bool {
        self >= ReadyState::HaveCurrentData
    }
}
