//! Print the OpenAPI document as JSON.

use std::io::Write;

use canvassing_backend::ApiDoc;
use utoipa::OpenApi;

fn main() -> std::io::Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .map_err(std::io::Error::other)?;
    std::io::stdout().write_all(json.as_bytes())
}
