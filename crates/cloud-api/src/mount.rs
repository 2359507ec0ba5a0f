use crate::{CloudApi, Mount};

use nb_cloud_client::{ApiRequest, ClientError};

pub use list::exec as list;
pub mod list {
	use super::*;

	pub async fn exec(api: &CloudApi) -> Result<Vec<Mount>, ClientError> {
		api.fetch(ApiRequest::get("/mounts")).await
	}
}
