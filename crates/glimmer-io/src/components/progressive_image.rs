//! Progressive image component: skeleton, thumbnail, spinner, final image.

use std::fmt::Write;
use std::rc::Rc;
use std::time::Duration;

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdLoader;
use glimmer_reveal::{
    Command, Event, ImageSource, ImageStyle, ResizeMode, ResolvedSources, RevealConfig,
    RevealMachine, StaticAssets,
};

use crate::{prefetch, style};

/// Props for the [`ProgressiveImage`] component.
#[derive(Props, Clone, PartialEq)]
pub struct ProgressiveImageProps {
    /// Full-resolution image: an asset name, a locator, or a descriptor.
    source: Option<ImageSource>,
    /// Low-resolution placeholder shown until the full image fades in.
    thumbnail: Option<ImageSource>,
    /// How the images fit the box.
    #[props(default)]
    resize_mode: ResizeMode,
    /// Box dimensions and corner radius.
    #[props(default)]
    style: ImageStyle,
    /// Timing, optimizer and colour settings. Read once at mount.
    #[props(default)]
    config: RevealConfig,
}

/// Reactive handles the command executor writes to.
#[derive(Clone, Copy)]
struct Driver {
    machine: Signal<RevealMachine>,
    pulsing: Signal<bool>,
    /// Active fade duration; `None` means opacity changes jump.
    fade: Signal<Option<Duration>>,
}

impl Driver {
    /// Feed `event` to the machine and execute the resulting commands.
    fn dispatch(mut self, event: Event) {
        let commands = self.machine.write().handle(event);
        for command in commands {
            match command {
                Command::ResetFade => self.fade.set(None),
                Command::StartFade { duration, .. } => self.fade.set(Some(duration)),
                Command::StartPulse => self.pulsing.set(true),
                Command::StopPulse => self.pulsing.set(false),
                Command::IssuePrefetch(ticket) => {
                    spawn(async move {
                        let outcome = prefetch::run_ticket(&ticket).await;
                        self.dispatch(Event::PrefetchSettled { ticket, outcome });
                    });
                }
                Command::DefusePrefetch { generation } => {
                    // The in-flight task still settles; the machine drops it.
                    log::debug!("prefetch {generation} superseded");
                }
            }
        }
    }
}

/// Renders an image that reveals progressively.
///
/// Static assets are looked up in the `Rc<StaticAssets>` context when one
/// is provided. Network images are prefetched before the final layer is
/// mounted, and the final layer fades in once it has loaded. Changing
/// `source` restarts the reveal; changing only `thumbnail` does not.
#[component]
pub fn ProgressiveImage(props: ProgressiveImageProps) -> Element {
    let assets: Rc<StaticAssets> = try_use_context().unwrap_or_default();
    let config = props.config.clone();

    let driver = Driver {
        machine: use_signal(|| RevealMachine::new(&config)),
        pulsing: use_signal(|| false),
        fade: use_signal(|| None),
    };

    // Re-resolve whenever the references change.
    {
        let optimizer = config.optimizer.clone();
        use_effect(use_reactive(
            (&props.source, &props.thumbnail),
            move |(source, thumbnail)| {
                let sources = ResolvedSources::resolve(
                    source.as_ref(),
                    thumbnail.as_ref(),
                    &*assets,
                    &optimizer,
                );
                driver.dispatch(Event::SourceChanged(sources));
            },
        ));
    }

    use_drop(move || {
        let mut machine = driver.machine;
        if let Ok(mut machine) = machine.try_write() {
            let commands = machine.handle(Event::Teardown);
            log::debug!("teardown: {commands:?}");
        }
    });

    let (layers, generation) = {
        let machine = driver.machine.read();
        (machine.layers(), machine.state().generation())
    };
    let theme = &config.theme;
    let mode = props.resize_mode;
    let fade_ms = (driver.fade)().map_or(0, |d| d.as_millis());

    let mut wrapper = style::wrapper(&props.style);
    if layers.backdrop {
        let _ = write!(wrapper, " background-color: {};", theme.backdrop);
    }

    rsx! {
        div { style: "{wrapper}",
            style { dangerous_inner_html: style::keyframes(&config.pulse) }

            if layers.skeleton {
                div { style: style::skeleton(&theme.skeleton, &config.pulse, (driver.pulsing)()) }
            }

            if let Some(thumbnail) = layers.thumbnail {
                img {
                    src: "{thumbnail.href()}",
                    alt: "",
                    style: style::image_layer(mode, 1.0),
                }
            }

            if layers.spinner {
                div { style: style::spinner_layer(&theme.spinner),
                    div { style: style::spinner_icon(),
                        Icon { icon: LdLoader, width: 28, height: 28 }
                    }
                }
            }

            if let Some(final_image) = layers.final_image {
                if mode == ResizeMode::Repeat {
                    div {
                        style: style::with_fade(
                            style::tiled_background(final_image.source.href(), final_image.fade_target),
                            fade_ms,
                        ),
                    }
                }
                img {
                    src: "{final_image.source.href()}",
                    alt: "",
                    style: style::final_layer(mode, final_image.fade_target, fade_ms),
                    onload: move |_| {
                        driver.dispatch(Event::FinalImageLoaded { generation });
                    },
                    onerror: move |_| {
                        log::warn!("final image {generation} failed to display");
                    },
                }
            }
        }
    }
}
