//! Live rendering of the run's progress stream.

use indicatif::{ProgressBar, ProgressStyle};

use crate::progress::{Polled, ProgressEvent, ProgressStream, KEEP_ALIVE_WAIT};

/// Create a spinner for the scan phase.
fn create_scan_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

/// Create the media-phase bar.
fn create_media_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Downloading media [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap()
            .progress_chars("#>-"),
    );
    bar
}

/// Drain the progress stream until its terminal event.
///
/// With `json` set, every event is printed as one JSON line; otherwise scan
/// progress renders as a spinner and the media phase as a bar. Returns the
/// terminal event, or `None` if the stream closed without one.
pub async fn render_events(stream: &mut ProgressStream, json: bool) -> Option<ProgressEvent> {
    let mut scan_spinner: Option<ProgressBar> = None;
    let mut media_bar: Option<ProgressBar> = None;

    let finish = |scan_spinner: &mut Option<ProgressBar>, media_bar: &mut Option<ProgressBar>| {
        if let Some(spinner) = scan_spinner.take() {
            spinner.finish_and_clear();
        }
        if let Some(bar) = media_bar.take() {
            bar.finish_and_clear();
        }
    };

    loop {
        match stream.next_event(KEEP_ALIVE_WAIT).await {
            Polled::KeepAlive => continue,
            Polled::Closed => {
                finish(&mut scan_spinner, &mut media_bar);
                return None;
            }
            Polled::Event(event) => {
                if json {
                    if let Ok(line) = serde_json::to_string(&event) {
                        println!("{}", line);
                    }
                } else {
                    match &event {
                        ProgressEvent::Progress { scanned } => {
                            let spinner =
                                scan_spinner.get_or_insert_with(create_scan_spinner);
                            spinner.set_message(format!("Scanned {} messages", scanned));
                        }
                        ProgressEvent::MediaPhase { total_media } => {
                            if let Some(spinner) = scan_spinner.take() {
                                spinner.finish_and_clear();
                            }
                            media_bar = Some(create_media_bar(*total_media));
                        }
                        ProgressEvent::MediaProgress {
                            processed_count, ..
                        } => {
                            if let Some(bar) = &media_bar {
                                bar.set_position(*processed_count);
                            }
                        }
                        ProgressEvent::Complete { .. } | ProgressEvent::Error { .. } => {}
                    }
                }

                if event.is_terminal() {
                    finish(&mut scan_spinner, &mut media_bar);
                    return Some(event);
                }
            }
        }
    }
}
