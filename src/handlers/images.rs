use actix_files::NamedFile;
use actix_web::{get, web};
use tracing::debug;

use crate::{errors::AppError, GlobalState};

/// Serves a stored thumbnail. Names that are unknown or would leave the
/// upload directory are both reported as missing.
#[get("/{filename}")]
pub async fn serve_image(data:web::Data<GlobalState>, path:web::Path<String>) -> Result<NamedFile, AppError>{
    let filename = path.into_inner();
    let missing = || AppError::NotFound(format!("File not found: {}", filename));

    let Some(file_path) = data.storage.resolve(&filename) else {
        debug!(file = %filename, "rejected unsafe image name");
        return Err(missing());
    };

    match NamedFile::open_async(&file_path).await {
        Ok(file) => Ok(file),
        Err(e) => {
            debug!(error = %e, file = %filename, "image not served");
            Err(missing())
        }
    }
}
