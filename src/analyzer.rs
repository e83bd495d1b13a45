use log::{info, warn};
use tokio::sync::Mutex;

use crate::alerts;
use crate::client::{generate_text, TextGenerator};
use crate::collectors::ResourceSampler;
use crate::error::AppError;
use crate::models::{Alert, ImageAnalysis, Sample, SuggestionRecord};
use crate::prompt;
use crate::session::Session;
use crate::upload::UploadedImage;

// The session lock is never held across a generation call.

/// Runs the default analysis on `image`, then answers `question` about the
/// same image when one is given. The session keeps its previous analysis
/// unless both calls succeed.
pub async fn analyze_image(
    session: &Mutex<Session>,
    generator: &dyn TextGenerator,
    image: &UploadedImage,
    question: Option<&str>,
) -> Result<ImageAnalysis, AppError> {
    let analysis = generate_text(generator, prompt::IMAGE_ANALYSIS_PROMPT, Some(image)).await?;

    let answer = match question.map(str::trim).filter(|q| !q.is_empty()) {
        Some(question) => Some(generate_text(generator, question, Some(image)).await?),
        None => None,
    };

    info!(
        "Image analysis complete ({} bytes, question answered: {})",
        image.bytes.len(),
        answer.is_some()
    );
    let result = ImageAnalysis { analysis, answer };
    session.lock().await.image_analysis = Some(result.clone());
    Ok(result)
}

/// Samples once, appends the reading to the history and returns it with the
/// alerts it raises against the session's thresholds.
pub async fn sample_once(
    session: &Mutex<Session>,
    sampler: &dyn ResourceSampler,
) -> Result<(Sample, Vec<Alert>), AppError> {
    let sample = sampler.sample().await?;

    let mut session = session.lock().await;
    session.samples.push(sample);
    let alerts = alerts::check(&sample, &session.thresholds.to_vec());
    drop(session);

    for alert in &alerts {
        warn!("{}", alert);
    }
    Ok((sample, alerts))
}

/// Asks for suggestions about a fresh sample. The suggestion history only
/// grows when the generation call succeeds.
pub async fn suggest(
    session: &Mutex<Session>,
    sampler: &dyn ResourceSampler,
    generator: &dyn TextGenerator,
) -> Result<SuggestionRecord, AppError> {
    let (sample, _) = sample_once(session, sampler).await?;
    let prompt_text = prompt::suggestion_prompt(&sample);
    let response_text = generate_text(generator, &prompt_text, None).await?;

    let record = SuggestionRecord {
        prompt_text,
        response_text,
    };
    session.lock().await.suggestions.push(record.clone());
    Ok(record)
}
