use std::io::{self, Read};

use super::{LockMethod, TransportError, Values};

/// Response body returned by a transport.
///
/// Lock calls only look at success or failure; the client reads the body to
/// the end and drops it so the connection can be reused.
pub type ResponseBody = Box<dyn Read + Send>;

/// An empty response body.
pub fn empty_body() -> ResponseBody {
    Box::new(io::empty())
}

/// Read `body` to the end, discarding the bytes.
pub(crate) fn drain_body(mut body: ResponseBody) {
    // A short read only costs connection reuse.
    let _ = io::copy(&mut body, &mut io::sink());
}

/// Authenticated request/response channel to one peer.
///
/// Implementations must be safe to call from many threads at once and own
/// their connection resources; two lock clients never share one.
pub trait Transport: Send + Sync {
    /// Invoke `method` on the peer's lock service with `values` as flat
    /// request parameters. `length` is the body length, or `-1` when
    /// unknown or absent.
    fn call(
        &self,
        method: LockMethod,
        values: &Values,
        body: Option<Vec<u8>>,
        length: i64,
    ) -> Result<ResponseBody, TransportError>;

    /// Release connection resources. Calls after `close` may fail.
    fn close(&self) {}
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn call(
        &self,
        method: LockMethod,
        values: &Values,
        body: Option<Vec<u8>>,
        length: i64,
    ) -> Result<ResponseBody, TransportError> {
        (**self).call(method, values, body, length)
    }

    fn close(&self) {
        (**self).close()
    }
}
