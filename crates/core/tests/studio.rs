mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeGenerator, photo};
use hairpiece_core::ads::{AdGateway, GateOutcome, NoAds};
use hairpiece_core::studio::MISSING_INPUT_MESSAGE;
use hairpiece_core::{AdSettings, AppError, LoadingState, Studio};
use tokio::time::Instant;

fn studio(generator: FakeGenerator) -> Studio<FakeGenerator> {
    Studio::new(AdGateway::new(NoAds, AdSettings::default()), generator)
}

#[tokio::test(start_paused = true)]
async fn missing_photo_is_rejected_before_any_call() {
    let studio = studio(FakeGenerator::succeeding(Duration::ZERO));

    let err = studio.generate(None, "curly mullet").await.unwrap_err();

    assert!(matches!(err, AppError::MalformedInput(_)));
    assert_eq!(err.to_string(), MISSING_INPUT_MESSAGE);
    assert!(!studio.gateway().skip_placeholder());
    assert_eq!(studio.loading_state(), LoadingState::default());
}

#[tokio::test(start_paused = true)]
async fn blank_description_is_rejected_before_any_call() {
    let studio = studio(FakeGenerator::succeeding(Duration::ZERO));
    let photo = photo();

    let start = Instant::now();
    let err = studio.generate(Some(&photo), "   \n").await.unwrap_err();

    assert!(matches!(err, AppError::MalformedInput(_)));
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn gate_and_generation_run_concurrently() {
    let studio = studio(FakeGenerator::succeeding(Duration::from_secs(2)));
    let photo = photo();

    let start = Instant::now();
    let report = studio
        .generate(Some(&photo), " long braids ")
        .await
        .unwrap();

    // 5s handshake timeout + 15s placeholder; the 2s edit overlaps them.
    assert_eq!(start.elapsed(), Duration::from_secs(20));
    assert_eq!(report.gate, GateOutcome::Completed);
    assert_eq!(report.image.data, "edited:long braids");
    assert_eq!(studio.loading_state(), LoadingState::default());
}

#[tokio::test(start_paused = true)]
async fn skipping_the_placeholder_hides_only_the_ad_overlay() {
    let studio = Arc::new(studio(FakeGenerator::succeeding(Duration::from_secs(30))));
    let state = studio.subscribe();

    let running = {
        let studio = Arc::clone(&studio);
        tokio::spawn(async move {
            let photo = photo();
            studio.generate(Some(&photo), "buzz cut").await
        })
    };

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(
        *state.borrow(),
        LoadingState {
            loading: true,
            showing_ad: true
        }
    );

    assert!(studio.gateway().skip_placeholder());
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(
        *state.borrow(),
        LoadingState {
            loading: true,
            showing_ad: false
        }
    );

    let report = running.await.unwrap().unwrap();
    assert_eq!(report.gate, GateOutcome::Dismissed);
    assert_eq!(*state.borrow(), LoadingState::default());
}

#[tokio::test(start_paused = true)]
async fn generation_failure_propagates_after_gate() {
    let studio = studio(FakeGenerator::failing(Duration::from_secs(1)));
    let photo = photo();

    let err = studio.generate(Some(&photo), "pixie cut").await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Failed to generate image: No image generated in response"
    );
    assert_eq!(studio.loading_state(), LoadingState::default());
}

#[tokio::test(start_paused = true)]
async fn generator_is_called_once_per_action() {
    let generator = FakeGenerator::succeeding(Duration::ZERO);
    let studio = studio(generator);
    let photo = photo();

    studio.generate(Some(&photo), "undercut").await.unwrap();
    studio.generate(Some(&photo), "undercut").await.unwrap();
    studio.generate(None, "undercut").await.unwrap_err();

    assert_eq!(studio_calls(&studio), 2);
}

#[tokio::test(start_paused = true)]
async fn summary_json_omits_image_payload() {
    let studio = studio(FakeGenerator::succeeding(Duration::ZERO));
    let photo = photo();

    let report = studio.generate(Some(&photo), "afro").await.unwrap();
    let json = report.summary_json(Some("out.png")).unwrap();

    assert_eq!(
        json,
        r#"{"mime_type":"image/png","gate":"completed","output":"out.png"}"#
    );
}

fn studio_calls(studio: &Studio<FakeGenerator>) -> usize {
    studio.generator().calls()
}
