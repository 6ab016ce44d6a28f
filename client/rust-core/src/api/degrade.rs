use std::future::Future;

use crate::error::ClientError;
use crate::metrics::record_degraded_fetch;

/// A fetch that failed and was replaced by placeholder data.
#[derive(Debug)]
pub struct Degraded<T> {
    pub resource: &'static str,
    pub placeholder: T,
    pub cause: ClientError,
}

impl<T> Degraded<T> {
    pub fn into_placeholder(self) -> T {
        self.placeholder
    }
}

pub type Fetched<T> = Result<T, Degraded<T>>;

/// Awaits `fetch`; on failure logs, counts and hands back `placeholder()`
/// wrapped in `Degraded` so callers can mark the view.
pub async fn fetch_or_degrade<T, Fut, P>(resource: &'static str, fetch: Fut, placeholder: P) -> Fetched<T>
where
    Fut: Future<Output = crate::error::Result<T>>,
    P: FnOnce() -> T,
{
    match fetch.await {
        Ok(data) => Ok(data),
        Err(cause) => {
            tracing::warn!(resource, error = %cause, "Fetch failed, using placeholder data");
            record_degraded_fetch(resource);
            Err(Degraded {
                resource,
                placeholder: placeholder(),
                cause,
            })
        }
    }
}

/// Unwraps either side, noting degraded resources in `degraded`.
pub fn settle<T>(fetched: Fetched<T>, degraded: &mut Vec<&'static str>) -> T {
    match fetched {
        Ok(data) => data,
        Err(d) => {
            degraded.push(d.resource);
            d.into_placeholder()
        }
    }
}
