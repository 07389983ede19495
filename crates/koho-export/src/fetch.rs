//! Fetching export tables through the client.

use koho_api_client::{KohoClient, Request};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::table::{ExportTable, HeaderLayout};

/// Query value selecting the JSON array-of-arrays export format.
pub const JSON_FORMAT: &str = "json";

/// Issue an export request and parse the payload as a table.
///
/// `format=json` is added to the request parameters.
#[instrument(skip(client, request), fields(url = %request.url))]
pub async fn fetch_table(
    client: &KohoClient,
    request: Request,
    layout: HeaderLayout,
) -> Result<ExportTable> {
    let value = client.request(request.param("format", JSON_FORMAT)).await?;
    let table = ExportTable::from_value(value, layout)?;
    debug!(rows = table.len(), columns = table.header().len(), "Export table received");
    Ok(table)
}
