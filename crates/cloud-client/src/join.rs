//! Explicit joins for fanning out independent requests.

use std::future::Future;

use futures_concurrency::future::{Join, TryJoin};

/// Drives every future to completion, even when some of them fail, and returns their results in
/// input order
pub async fn all_settled<F, T, E>(futures: Vec<F>) -> Vec<Result<T, E>>
where
	F: Future<Output = Result<T, E>>,
{
	futures.join().await
}

/// Resolves with every output in input order, or with the first error; the futures still
/// pending at that point are dropped
pub async fn all_or_nothing<F, T, E>(futures: Vec<F>) -> Result<Vec<T>, E>
where
	F: Future<Output = Result<T, E>>,
{
	futures.try_join().await
}
