// Aggregates all integration tests as modules.
mod cancellation;
mod listings;
mod report_stream;
