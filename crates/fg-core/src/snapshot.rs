//! Binary canvas snapshots (MessagePack via `rmp-serde`).
//!
//! Markup inside a snapshot is untrusted: decoding re-sanitizes it through
//! `ComponentMarkup`'s `Deserialize` impl.

use crate::component::PlacedComponent;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode snapshot: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("unsupported snapshot version {found} (expected {})", SNAPSHOT_VERSION)]
    Version { found: u32 },
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    components: &'a [PlacedComponent],
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    components: Vec<PlacedComponent>,
}

/// Encode components in z-order.
pub fn encode(components: &[PlacedComponent]) -> Result<Vec<u8>, SnapshotError> {
    let snapshot = SnapshotRef {
        version: SNAPSHOT_VERSION,
        components,
    };
    Ok(rmp_serde::to_vec_named(&snapshot)?)
}

/// Decode a snapshot produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Vec<PlacedComponent>, SnapshotError> {
    let snapshot: Snapshot = rmp_serde::from_slice(bytes)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::Version {
            found: snapshot.version,
        });
    }
    Ok(snapshot.components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentMarkup;
    use crate::geometry::Frame;
    use crate::id::ComponentId;
    use crate::sanitize::SanitizePolicy;
    use kurbo::{Point, Size};
    use pretty_assertions::assert_eq;

    fn component(markup: &str, x: f64) -> PlacedComponent {
        PlacedComponent::new(
            ComponentId::generate(),
            ComponentMarkup::from_untrusted(markup, &SanitizePolicy::default()),
            Frame::new(Point::new(x, 40.0), Size::new(320.0, 180.0)),
            Some("hero banner"),
        )
    }

    #[test]
    fn snapshot_roundtrip() {
        let components = vec![
            component(r#"<section class="hero"><h1>Hi</h1></section>"#, 10.0),
            component("<button>Go</button>", 400.0),
        ];
        let bytes = encode(&components).expect("encode");
        let decoded = decode(&bytes).expect("decode");
        assert_eq!(decoded, components);
        assert_eq!(decoded[0].markup.canonical(), r#"<section class="hero"><h1>Hi</h1></section>"#);
    }

    #[test]
    fn rejects_garbage() {
        let err = decode(b"\xc1\x00not msgpack").expect_err("garbage must fail");
        assert!(matches!(err, SnapshotError::Decode(_)));
    }

    #[test]
    fn rejects_future_version() {
        #[derive(Serialize)]
        struct Future {
            version: u32,
            components: Vec<PlacedComponent>,
        }
        let bytes = rmp_serde::to_vec_named(&Future {
            version: 99,
            components: Vec::new(),
        })
        .expect("encode");
        let err = decode(&bytes).expect_err("version must fail");
        assert_eq!(err.to_string(), "unsupported snapshot version 99 (expected 1)");
    }
}
