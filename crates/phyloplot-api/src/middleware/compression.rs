//! Response compression layer.

use tower_http::compression::predicate::{And, NotForContentType};
use tower_http::compression::{CompressionLayer, DefaultPredicate, Predicate};

/// When a response is worth compressing.
pub type CompressionPredicate = And<DefaultPredicate, NotForContentType>;

/// Builds a gzip compression layer.
///
/// The default predicate already skips raster `image/*` bodies; PDF
/// artifacts are compressed streams too and are skipped as well. JSON and
/// SVG responses are still compressed.
pub fn build_compression_layer() -> CompressionLayer<CompressionPredicate> {
    CompressionLayer::new().compress_when(
        DefaultPredicate::new().and(NotForContentType::new("application/pdf")),
    )
}
