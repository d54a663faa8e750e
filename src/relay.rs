use log::info;

use crate::context::RelayContext;
use crate::error::RelayError;
use crate::forward::setup_forward;
use crate::stream::{local_addr, stream_gps, ChunkSink, StreamEnd};

/// Forward, settle, then stream. The stream stage never starts unless the
/// forward succeeded.
pub async fn run<S: ChunkSink>(ctx: &RelayContext, sink: &mut S) -> Result<StreamEnd, RelayError> {
    setup_forward(&ctx.request).await?;

    tokio::time::sleep(ctx.settle).await;

    let addr = local_addr(ctx.request.local_port);
    info!("Connecting to {}...", addr);
    Ok(stream_gps(addr, sink).await?)
}
