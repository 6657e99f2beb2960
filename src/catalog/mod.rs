mod clean;
mod load;
mod models;
mod normalizer;
mod raw;
mod revalidate;
mod thumbnail;
mod title;
mod video_id;

pub use clean::{clean_catalog, write_catalog, CleanedCatalog, CleaningStats};
pub use load::{load_raw_catalog, parse_raw_catalog, DataError};
pub use models::{compare_names, Artist, Catalog, SearchHit, Song};
pub use normalizer::{
    normalize, normalize_without_validation, validate_videos, Normalized, NormalizerSettings,
    ValidationError, ValidationMode, ValidationProgress, ValidationReport, ValidationStats,
    DEFAULT_BATCH_SIZE,
};
pub use raw::{count_raw_videos, RawArtistRecord, RawVideoRecord};
pub use revalidate::Revalidator;
pub use thumbnail::{
    classify, measure_placeholder, HttpThumbnailProbe, LocalThumbnails, ProbeFailure,
    ThumbnailProbe, ThumbnailVerdict,
};
pub use title::clean_title;
pub use video_id::{extract_video_id, VIDEO_ID_LEN};
