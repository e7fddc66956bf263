use std::sync::Arc;

use tracing::{error, warn};

use crate::domain::repository::{
    DisasterPublishLogRepository, ReportTransmitLogRepository, TcpReceiveLogRepository,
};
use crate::protocol::envelope::Envelope;
use crate::session::driver::InboundHandler;
use crate::usecase::disaster_intake::DisasterIntakeUseCase;
use crate::usecase::report_transmit::{FrameSink, ReportTransmitEngine};

/// Routes authenticated-link frames into the two inbound pipelines.
pub struct LinkHandlers<I, O, R, P, S>
where
    I: TcpReceiveLogRepository,
    O: DisasterPublishLogRepository,
    R: ReportTransmitLogRepository + 'static,
    P: DisasterPublishLogRepository + 'static,
    S: FrameSink + 'static,
{
    pub intake: DisasterIntakeUseCase<I, O>,
    pub transmit: Arc<ReportTransmitEngine<R, P, S>>,
}

impl<I, O, R, P, S> InboundHandler for LinkHandlers<I, O, R, P, S>
where
    I: TcpReceiveLogRepository,
    O: DisasterPublishLogRepository,
    R: ReportTransmitLogRepository + 'static,
    P: DisasterPublishLogRepository + 'static,
    S: FrameSink + 'static,
{
    async fn on_disaster_notify(&self, body: &str) -> Option<Envelope> {
        Some(self.intake.execute(body).await)
    }

    async fn on_report_ack(&self, envelope: Envelope) {
        let Some(outbound_id) = envelope.trans_msg_id else {
            warn!("report ack missing transMsgId");
            return;
        };
        let Some(report_sequence) = envelope.trans_msg_seq else {
            warn!(outbound_id = %outbound_id, "report ack missing transMsgSeq");
            return;
        };
        let result_code = envelope.result_code.unwrap_or_default();

        if let Err(err) = self
            .transmit
            .handle_ack(&outbound_id, report_sequence, &result_code)
            .await
        {
            error!(outbound_id = %outbound_id, error = %err, "report ack handling failed");
        }
    }
}
