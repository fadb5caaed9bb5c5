use std::rc::Rc;

use dioxus::prelude::*;
use glimmer_io::ProgressiveImage;
use glimmer_reveal::{ImageDescriptor, ImageSource, ImageStyle, LocalResource, ResizeMode, StaticAssets};

/// Network images the cycling card rotates through.
const CYCLE: [&str; 3] = [
    "https://picsum.photos/id/1015/640/400",
    "https://picsum.photos/id/1025/640/400",
    "https://picsum.photos/id/1043/640/400",
];

/// How long each cycling image stays before the next one is requested.
const CYCLE_INTERVAL_MS: u32 = 4_000;

fn main() {
    // A second init only fails if a logger is already installed.
    let _ = glimmer_io::logging::init(log::LevelFilter::Debug);
    dioxus::launch(app);
}

/// The in-repo asset catalog served next to the app.
fn catalog() -> StaticAssets {
    StaticAssets::new()
        .with_name(
            "sand",
            ImageDescriptor::Local(LocalResource::new(
                "assets/images/sand.jpg",
                "/assets/images/sand.jpg",
            )),
        )
        .with_name(
            "sand-thumb",
            ImageDescriptor::Local(LocalResource::new(
                "assets/images/sand-thumb.jpg",
                "/assets/images/sand-thumb.jpg",
            )),
        )
        .with_resource(
            "assets/optimized-images/dunes.jpg",
            "/assets/optimized-images/dunes.jpg",
        )
}

/// Root application component: a gallery of reveal cases.
fn app() -> Element {
    use_context_provider(|| Rc::new(catalog()));

    let mut cycle_index = use_signal(|| 0usize);
    use_future(move || async move {
        loop {
            gloo_timers::future::TimeoutFuture::new(CYCLE_INTERVAL_MS).await;
            cycle_index += 1;
            log::debug!("cycling to image {}", cycle_index() % CYCLE.len());
        }
    });

    let card = ImageStyle {
        width: Some(320.0),
        height: Some(200.0),
        border_radius: Some(12.0),
    };

    rsx! {
        div { style: "font-family: sans-serif; padding: 24px;",
            h1 { "glimmer" }
            p { "Progressive image reveal: skeleton, thumbnail, prefetch, cross-fade." }

            div { style: "display: grid; grid-template-columns: repeat(auto-fill, 320px); gap: 24px;",
                Card { title: "Network image",
                    ProgressiveImage {
                        source: ImageSource::from(CYCLE[0]),
                        style: card,
                    }
                }
                Card { title: "Network image with thumbnail",
                    ProgressiveImage {
                        source: ImageSource::from(CYCLE[1]),
                        thumbnail: ImageSource::from("sand-thumb"),
                        style: card,
                    }
                }
                Card { title: "Local asset",
                    ProgressiveImage {
                        source: ImageSource::from("sand"),
                        resize_mode: ResizeMode::Contain,
                        style: card,
                    }
                }
                Card { title: "Optimized variant",
                    ProgressiveImage {
                        source: ImageSource::from("assets/images/dunes.jpg"),
                        style: card,
                    }
                }
                Card { title: "Missing optimized variant",
                    ProgressiveImage {
                        source: ImageSource::from("assets/images/missing.jpg"),
                        style: card,
                    }
                }
                Card { title: "Failing prefetch",
                    ProgressiveImage {
                        source: ImageSource::from("https://invalid.example/nope.jpg"),
                        style: card,
                    }
                }
                Card { title: "Tiled",
                    ProgressiveImage {
                        source: ImageSource::from("sand-thumb"),
                        resize_mode: ResizeMode::Repeat,
                        style: card,
                    }
                }
                Card { title: "Cycling source",
                    ProgressiveImage {
                        source: ImageSource::from(CYCLE[cycle_index() % CYCLE.len()]),
                        thumbnail: ImageSource::from("sand-thumb"),
                        style: card,
                    }
                }
            }
        }
    }
}

/// A titled gallery cell.
#[component]
fn Card(title: String, children: Element) -> Element {
    rsx! {
        div {
            h3 { style: "font-size: 14px; margin: 0 0 8px;", "{title}" }
            {children}
        }
    }
}
