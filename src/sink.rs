use crate::stream::Stream;

/// Drain `stream` on the calling thread, passing each value to `consumer`.
///
/// Returns the first error `consumer` produces, unchanged, without reading
/// any further values; the remaining stream is dropped, which disconnects
/// its producer. Returns `Ok(())` once the stream closes. Cancellation is
/// observed through upstream stages closing early.
pub fn consume<T, E, F>(stream: Stream<T>, mut consumer: F) -> Result<(), E>
where
    F: FnMut(T) -> Result<(), E>,
{
    let stats = stream.stats().clone();
    for value in stream {
        if let Err(err) = consumer(value) {
            tracing::debug!(stage = stats.name(), "consumer returned an error");
            return Err(err);
        }
    }
    Ok(())
}
