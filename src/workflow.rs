use tracing::{error, info, warn};

use crate::{
    api::PresentationApi,
    error::ClientError,
    models::{GenerateRequest, GenerationResult, SubmissionRequest},
    state::FormHandle,
};

/// Runs one form submission: upload every selected file in order, then ask
/// for the presentation. The first failure ends the attempt.
pub async fn submit<A>(api: &A, form: &FormHandle, request: SubmissionRequest) -> Result<GenerationResult, ClientError>
where
    A: PresentationApi + ?Sized,
{
    let submission_id = match form.begin(&request) {
        Ok(id) => id,
        Err(e) => {
            warn!("⚠️ Submission refused: {}", e);
            return Err(e);
        }
    };
    info!(%submission_id, "🚀 Submission accepted: topic='{}' slides={} files={}", request.topic, request.slide_count.get(), request.files.len());

    let mut unfinished = Unfinished { form, armed: true };
    let outcome = run(api, form, &request).await;
    unfinished.armed = false;
    match &outcome {
        Ok(result) => {
            info!(%submission_id, "✅ Presentation ready (download_url={})", result.download_url.is_some());
            form.complete(result);
        }
        Err(e) => {
            error!(%submission_id, "❌ Submission failed: {}", e);
            form.fail(e);
        }
    }
    outcome
}

/// Fails the form if the submission future is dropped before it settles,
/// so the loading state never outlives its submission.
struct Unfinished<'a> {
    form: &'a FormHandle,
    armed: bool,
}

impl Drop for Unfinished<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("⚠️ Submission dropped before it finished");
            self.form.fail(&ClientError::Interrupted);
        }
    }
}

async fn run<A>(api: &A, form: &FormHandle, request: &SubmissionRequest) -> Result<GenerationResult, ClientError>
where
    A: PresentationApi + ?Sized,
{
    let mut document_keys = Vec::with_capacity(request.files.len());
    for (index, file) in request.files.iter().enumerate() {
        info!("📦 Uploading file {}/{}: {}", index + 1, request.files.len(), file.name);
        let slot = api.request_upload_slot(&file.name, &file.content_type).await?;
        api.upload_file(&slot.upload_url, file.bytes.clone(), &file.content_type).await?;
        document_keys.push(slot.file_key);
        form.file_uploaded();
    }

    form.generating();
    api.generate(&GenerateRequest {
        topic: request.topic.clone(),
        num_slides: request.slide_count,
        document_keys,
    })
    .await
}
