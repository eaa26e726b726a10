pub mod royale;

use royale::Endpoint;
use std::future::Future;

/// Anything able to serve listing pages. Implementations own their retry
/// policy and report exhaustion as `None`.
pub trait PageSource {
    fn fetch_page(&self, endpoint: &Endpoint) -> impl Future<Output = Option<String>>;
}
