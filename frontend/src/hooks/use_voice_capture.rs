use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    Blob, BlobEvent, BlobPropertyBag, MediaRecorder, MediaStream, MediaStreamConstraints,
    MediaStreamTrack,
};
use yew::prelude::*;

use crate::config::SpeechToText;
use crate::services::api::ApiClient;
use crate::services::logging::Logger;

const LOG_COMPONENT: &str = "voice";

/// The one capture session that may be active, plus the handlers that must
/// stay alive while it runs.
enum ActiveCapture {
    Recorder {
        recorder: MediaRecorder,
        _on_data: Closure<dyn FnMut(BlobEvent)>,
    },
    Recognition {
        recognition: js_sys::Object,
        _on_result: Closure<dyn FnMut(JsValue)>,
        _on_end: Closure<dyn FnMut()>,
        _on_error: Closure<dyn FnMut(JsValue)>,
    },
}

#[derive(Clone)]
pub struct VoiceCaptureHandle {
    pub is_recording: bool,
    pub is_available: bool,
    pub start: Callback<()>,
    pub stop: Callback<()>,
}

/// Voice capture controller: `idle -> recording -> idle`, with the
/// speech-to-text capability chosen at configuration time.
///
/// Stopping returns to idle immediately; transcription runs fire-and-forget
/// and, on success, hands the recognized text to `on_transcript`. On any
/// failure the free-text input is left unchanged and the failure is logged.
#[hook]
pub fn use_voice_capture(
    backend: SpeechToText,
    api: &ApiClient,
    on_transcript: Callback<String>,
) -> VoiceCaptureHandle {
    let is_recording = use_state(|| false);
    let is_available = use_state(|| match backend {
        SpeechToText::RemoteTranscription => true,
        SpeechToText::BrowserNative => recognition_constructor().is_some(),
    });
    let active = use_mut_ref(|| Option::<ActiveCapture>::None);

    let start = {
        let api = api.clone();
        let on_transcript = on_transcript.clone();
        let active = active.clone();
        let is_recording = is_recording.clone();
        let is_available = is_available.clone();
        Callback::from(move |_| {
            // One capture session max: starting while already recording is a
            // no-op.
            if active.borrow().is_some() {
                return;
            }
            match backend {
                SpeechToText::RemoteTranscription => start_recorder(
                    api.clone(),
                    on_transcript.clone(),
                    active.clone(),
                    is_recording.clone(),
                    is_available.clone(),
                ),
                SpeechToText::BrowserNative => start_recognition(
                    on_transcript.clone(),
                    active.clone(),
                    is_recording.clone(),
                    is_available.clone(),
                ),
            }
        })
    };

    let stop = {
        let active = active.clone();
        let is_recording = is_recording.clone();
        Callback::from(move |_| {
            match active.borrow().as_ref() {
                Some(ActiveCapture::Recorder { recorder, .. }) => {
                    if recorder.stop().is_err() {
                        Logger::warn(LOG_COMPONENT, "Recorder was not in a stoppable state");
                    }
                }
                Some(ActiveCapture::Recognition { recognition, .. }) => {
                    if call_method(recognition, "stop").is_err() {
                        Logger::warn(LOG_COMPONENT, "Speech recognition refused to stop");
                    }
                }
                // Stop with no active capture is a no-op.
                None => return,
            }
            is_recording.set(false);
        })
    };

    VoiceCaptureHandle {
        is_recording: *is_recording,
        is_available: *is_available,
        start,
        stop,
    }
}

enum MicError {
    Unsupported(&'static str),
    Failed(String),
}

/// Record through `MediaRecorder` and transcribe via the remote service.
fn start_recorder(
    api: ApiClient,
    on_transcript: Callback<String>,
    active: Rc<RefCell<Option<ActiveCapture>>>,
    is_recording: UseStateHandle<bool>,
    is_available: UseStateHandle<bool>,
) {
    spawn_local(async move {
        let stream = match request_microphone().await {
            Ok(stream) => stream,
            Err(MicError::Unsupported(reason)) => {
                is_available.set(false);
                Logger::warn(LOG_COMPONENT, reason);
                return;
            }
            Err(MicError::Failed(message)) => {
                Logger::error(
                    LOG_COMPONENT,
                    &format!("Could not start recording: {}", message),
                );
                return;
            }
        };

        // A second start may have raced the permission prompt.
        if active.borrow().is_some() {
            stop_tracks(&stream);
            return;
        }

        let recorder = match MediaRecorder::new_with_media_stream(&stream) {
            Ok(recorder) => recorder,
            Err(_) => {
                stop_tracks(&stream);
                is_available.set(false);
                Logger::warn(
                    LOG_COMPONENT,
                    "Audio recording is not supported in this browser",
                );
                return;
            }
        };

        let chunks: Rc<RefCell<Vec<Blob>>> = Rc::new(RefCell::new(Vec::new()));
        let on_data = Closure::<dyn FnMut(BlobEvent)>::new({
            let chunks = chunks.clone();
            move |event: BlobEvent| {
                if let Some(data) = event.data() {
                    chunks.borrow_mut().push(data);
                }
            }
        });
        recorder.set_ondataavailable(Some(on_data.as_ref().unchecked_ref()));

        let on_stop = Closure::once_into_js({
            let stream = stream.clone();
            let active = active.clone();
            move || {
                // The session is over: release the capture entry (with its
                // dataavailable handler) and the microphone.
                active.borrow_mut().take();
                stop_tracks(&stream);

                let audio = match assemble_audio(&chunks.borrow()) {
                    Ok(audio) => audio,
                    Err(_) => {
                        Logger::error(LOG_COMPONENT, "Failed to assemble recorded audio");
                        return;
                    }
                };

                // Fire-and-forget relative to the capture state machine.
                spawn_local(async move {
                    match api.transcribe_audio(&audio).await {
                        Ok(text) => on_transcript.emit(text),
                        Err(message) => {
                            Logger::error(
                                LOG_COMPONENT,
                                &format!("Transcription failed: {}", message),
                            );
                        }
                    }
                });
            }
        });
        recorder.set_onstop(Some(on_stop.unchecked_ref()));

        if recorder.start().is_err() {
            stop_tracks(&stream);
            Logger::error(LOG_COMPONENT, "Failed to start the media recorder");
            return;
        }

        *active.borrow_mut() = Some(ActiveCapture::Recorder {
            recorder,
            _on_data: on_data,
        });
        is_recording.set(true);
        Logger::debug(LOG_COMPONENT, "Recording started");
    });
}

/// Recognize speech with the browser's built-in engine, where present.
/// Constructed reflectively because the constructor is still vendor-prefixed
/// in Chromium.
fn start_recognition(
    on_transcript: Callback<String>,
    active: Rc<RefCell<Option<ActiveCapture>>>,
    is_recording: UseStateHandle<bool>,
    is_available: UseStateHandle<bool>,
) {
    let Some(constructor) = recognition_constructor() else {
        is_available.set(false);
        Logger::warn(
            LOG_COMPONENT,
            "Speech recognition is not supported in this browser",
        );
        return;
    };
    let recognition: js_sys::Object = match Reflect::construct(&constructor, &Array::new()) {
        Ok(recognition) => recognition.into(),
        Err(_) => {
            is_available.set(false);
            Logger::warn(LOG_COMPONENT, "Speech recognition could not be constructed");
            return;
        }
    };

    set_property(&recognition, "lang", &"en-US".into());
    set_property(&recognition, "continuous", &JsValue::FALSE);
    set_property(&recognition, "interimResults", &JsValue::FALSE);

    let on_result = Closure::<dyn FnMut(JsValue)>::new({
        let on_transcript = on_transcript.clone();
        move |event: JsValue| match transcript_from_event(&event) {
            Some(text) => on_transcript.emit(text),
            None => Logger::warn(LOG_COMPONENT, "Speech recognition produced no transcript"),
        }
    });
    set_property(&recognition, "onresult", on_result.as_ref());

    let on_error = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
        let detail = Reflect::get(&event, &"error".into())
            .ok()
            .and_then(|error| error.as_string())
            .unwrap_or_else(|| "unknown".to_string());
        Logger::error(
            LOG_COMPONENT,
            &format!("Speech recognition error: {}", detail),
        );
    });
    set_property(&recognition, "onerror", on_error.as_ref());

    let on_end = Closure::<dyn FnMut()>::new({
        let active = active.clone();
        let is_recording = is_recording.clone();
        move || {
            // Clearing the entry drops this closure with it, so defer past
            // the current invocation.
            let active = active.clone();
            let is_recording = is_recording.clone();
            spawn_local(async move {
                active.borrow_mut().take();
                is_recording.set(false);
            });
        }
    });
    set_property(&recognition, "onend", on_end.as_ref());

    if call_method(&recognition, "start").is_err() {
        Logger::error(LOG_COMPONENT, "Failed to start speech recognition");
        return;
    }

    *active.borrow_mut() = Some(ActiveCapture::Recognition {
        recognition,
        _on_result: on_result,
        _on_end: on_end,
        _on_error: on_error,
    });
    is_recording.set(true);
}

async fn request_microphone() -> Result<MediaStream, MicError> {
    let window = web_sys::window().ok_or(MicError::Unsupported("No window available"))?;
    let devices = window
        .navigator()
        .media_devices()
        .map_err(|_| MicError::Unsupported("Media capture is not supported in this browser"))?;

    let constraints = MediaStreamConstraints::new();
    constraints.set_audio(&JsValue::TRUE);

    let promise = devices
        .get_user_media_with_constraints(&constraints)
        .map_err(|_| MicError::Unsupported("Microphone capture is not supported in this browser"))?;
    let stream = JsFuture::from(promise)
        .await
        .map_err(|_| MicError::Failed("Microphone access was denied".to_string()))?;
    stream
        .dyn_into::<MediaStream>()
        .map_err(|_| MicError::Failed("Unexpected media stream value".to_string()))
}

/// Release the microphone. Every path that acquires a stream must end here.
fn stop_tracks(stream: &MediaStream) {
    for track in stream.get_tracks().iter() {
        if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
            track.stop();
        }
    }
}

fn assemble_audio(chunks: &[Blob]) -> Result<Blob, JsValue> {
    let parts = Array::new();
    for chunk in chunks {
        parts.push(chunk.as_ref());
    }
    let options = BlobPropertyBag::new();
    options.set_type("audio/webm");
    Blob::new_with_blob_sequence_and_options(parts.as_ref(), &options)
}

fn recognition_constructor() -> Option<Function> {
    let window = web_sys::window()?;
    for name in ["SpeechRecognition", "webkitSpeechRecognition"] {
        if let Ok(value) = Reflect::get(window.as_ref(), &JsValue::from_str(name)) {
            if let Some(constructor) = value.dyn_ref::<Function>() {
                return Some(constructor.clone());
            }
        }
    }
    None
}

fn transcript_from_event(event: &JsValue) -> Option<String> {
    let results = Reflect::get(event, &"results".into()).ok()?;
    let first = Reflect::get_u32(&results, 0).ok()?;
    let alternative = Reflect::get_u32(&first, 0).ok()?;
    Reflect::get(&alternative, &"transcript".into())
        .ok()?
        .as_string()
}

fn set_property(target: &js_sys::Object, name: &str, value: &JsValue) {
    if Reflect::set(target, &JsValue::from_str(name), value).is_err() {
        Logger::warn(
            LOG_COMPONENT,
            &format!("Failed to configure speech recognition ({})", name),
        );
    }
}

fn call_method(target: &js_sys::Object, name: &str) -> Result<JsValue, JsValue> {
    let method = Reflect::get(target.as_ref(), &JsValue::from_str(name))?;
    let method = method
        .dyn_ref::<Function>()
        .ok_or_else(|| JsValue::from_str("not a function"))?;
    method.call0(target.as_ref())
}
