use serde::Serialize;

use crate::container::ContainerIdentity;
use crate::extract::LogRecord;

/// Value of the `job` label on every stream we push.
pub const JOB: &str = "docker-logs";

/// Body of a `POST /loki/api/v1/push` request.
#[derive(Debug, Serialize)]
pub struct PushRequest<'a> {
    pub streams: Vec<Stream<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Stream<'a> {
    pub stream: StreamLabels<'a>,
    pub values: &'a [LogRecord],
}

#[derive(Debug, Serialize)]
pub struct StreamLabels<'a> {
    pub job: &'static str,
    pub service_name: &'a str,
    pub container_id: &'a str,
}

impl<'a> PushRequest<'a> {
    /// One container's lines as a single stream.
    pub fn for_container(identity: &'a ContainerIdentity, records: &'a [LogRecord]) -> Self {
        Self {
            streams: vec![Stream {
                stream: StreamLabels {
                    job: JOB,
                    service_name: &identity.name,
                    container_id: &identity.id,
                },
                values: records,
            }],
        }
    }
}
