use dioxus::prelude::*;
use genmeta_core::export::{copy_all_text, workflow_file_name, workflow_json};
use genmeta_core::{ExtractedMetadata, Field, extract_png};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

// Define an enum for our application's state
#[derive(Clone, PartialEq)]
enum AppState {
    Idle,
    Loaded { metadata: ExtractedMetadata },
    Error(String),
}

// Trigger a file download in the browser
fn download_bytes(file_name: &str, bytes: &[u8]) {
    if let Err(err) = try_download(file_name, bytes) {
        log::warn!("could not download {file_name}: {err:?}");
    }
}

fn try_download(file_name: &str, bytes: &[u8]) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("no document body"))?;

    let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes).into());
    let blob = web_sys::Blob::new_with_u8_array_sequence(&parts)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)?;

    let anchor = document
        .create_element("a")?
        .dyn_into::<web_sys::HtmlAnchorElement>()?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    body.append_child(&anchor)?;
    anchor.click();
    body.remove_child(&anchor)?;
    web_sys::Url::revoke_object_url(&url)
}

fn copy_to_clipboard(text: String) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let promise = window.navigator().clipboard().write_text(&text);
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(err) = JsFuture::from(promise).await {
            log::warn!("clipboard write rejected: {err:?}");
        }
    });
}

fn app() -> Element {
    // Use signals for reactive state management
    let mut file_bytes = use_signal(|| None::<(String, Vec<u8>)>);
    let mut app_state = use_signal(|| AppState::Idle);

    // This effect runs whenever `file_bytes` changes
    use_effect(move || {
        if let Some((name, bytes)) = file_bytes() {
            log::info!("File loaded: {}, size: {}", name, bytes.len());
            match extract_png(&bytes, name) {
                Ok(metadata) => app_state.set(AppState::Loaded { metadata }),
                Err(e) => app_state.set(AppState::Error(e.to_string())),
            }
        }
    });

    let handle_file_upload = move |evt: FormEvent| async move {
        if let Some(file_engine) = &evt.files() {
            let files = file_engine.files();
            if let Some(file_name) = files.first() {
                if let Some(file) = file_engine.read_file(file_name).await {
                    file_bytes.set(Some((file_name.clone(), file)));
                }
            }
        }
    };

    rsx! {
        div {
            class: "min-h-screen bg-gray-100 flex items-center justify-center p-4",
            div {
                class: "max-w-2xl w-full bg-white rounded-lg shadow-xl p-8 space-y-6",
                // Header
                div {
                    class: "text-center",
                    h1 { class: "text-4xl font-bold text-gray-800", "GenMeta" }
                    p { class: "text-gray-500 mt-2", "See how an image was generated." }
                }

                // File Input
                div {
                    class: "flex flex-col items-center justify-center p-6 border-2 border-dashed border-gray-300 rounded-lg",
                    p { class: "text-gray-600 mb-4", "Select a PNG file to get started" }
                    label {
                        class: "file-input-button",
                        "Select File"
                        input {
                            r#type: "file",
                            class: "hidden",
                            accept: ".png",
                            oninput: handle_file_upload,
                        }
                    }
                }

                // Main Content Area
                match app_state() {
                    AppState::Idle => {
                        rsx! { p { class: "text-center text-gray-500", "The generation parameters will appear here." } }
                    },
                    AppState::Loaded { metadata } => {
                        let copy_text = copy_all_text(&metadata);
                        let workflow = workflow_json(&metadata).ok();
                        let has_workflow = workflow.is_some();
                        let download_name = workflow_file_name(&metadata.image_path);
                        let rows: Vec<(&'static str, String)> = Field::ALL
                            .iter()
                            .map(|&field| (field.label(), metadata.get(field).to_string()))
                            .collect();
                        rsx! {
                            div {
                                class: "space-y-4",
                                h3 { class: "text-xl font-semibold text-gray-700", "Parameters for ", span { class: "font-mono", "{metadata.image_path}" } }
                                if !metadata.has_generation_data() {
                                    p { "No generation metadata found." }
                                }
                                dl {
                                    class: "bg-gray-50 p-4 rounded-md max-h-96 overflow-y-auto space-y-2",
                                    for (label, value) in rows {
                                        div {
                                            dt { class: "font-semibold text-sm text-gray-600", "{label}" }
                                            dd { class: "font-mono text-sm whitespace-pre-wrap break-words", "{value}" }
                                        }
                                    }
                                }
                                button {
                                    class: "w-full bg-blue-600 hover:bg-blue-700 text-white font-bold py-2 px-4 rounded-md transition",
                                    onclick: move |_| copy_to_clipboard(copy_text.clone()),
                                    "Copy All"
                                }
                                if has_workflow {
                                    button {
                                        class: "w-full bg-green-600 hover:bg-green-700 text-white font-bold py-2 px-4 rounded-md transition",
                                        onclick: move |_| {
                                            if let Some(workflow) = &workflow {
                                                download_bytes(&download_name, workflow.as_bytes());
                                            }
                                        },
                                        "Download Workflow"
                                    }
                                }
                            }
                        }
                    },
                    AppState::Error(err) => {
                        rsx! { p { class: "text-red-500", "Error: {err}" } }
                    },
                }

                // Footer
                p {
                    class: "text-center text-xs text-gray-400 pt-4 border-t",
                    "All processing is done in your browser. Your files never leave your computer."
                }
            }
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    launch(app);
}
