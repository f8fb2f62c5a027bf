//! Browser host for DOM widgets, built on `web-sys`.

use super::projection::DomVisibility;
use super::registry::{DomHost, DomKey, DomSignal};
use super::{DomElementKind, DomWidget};
use crate::error::DomError;
use eframe::wasm_bindgen::closure::Closure;
use eframe::wasm_bindgen::{JsCast, JsValue};
use std::cell::RefCell;
use std::rc::Rc;
use web_sys::{Event, HtmlElement, HtmlInputElement, HtmlTextAreaElement};

type Listener = Closure<dyn FnMut(Event)>;

/// Mounts widget elements as absolutely positioned children of a container.
pub struct WebDomHost {
    container: HtmlElement,
}

/// One mounted element plus the listeners feeding its signal queue.
pub struct WebElement {
    element: HtmlElement,
    listeners: Vec<(&'static str, Listener)>,
    signals: Rc<RefCell<Vec<DomSignal>>>,
}

fn js_err(err: JsValue) -> DomError {
    DomError::Host(format!("{err:?}"))
}

impl WebDomHost {
    /// Uses the document body as the container.
    pub fn for_body() -> Result<Self, DomError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or(DomError::NoDocument)?;
        let container = document.body().ok_or(DomError::NoDocument)?;
        Ok(Self { container })
    }

    /// Uses the given element as the container.
    pub fn new(container: HtmlElement) -> Self {
        Self { container }
    }

    fn create(&self, widget: &DomWidget) -> Result<HtmlElement, DomError> {
        let document = self.container.owner_document().ok_or(DomError::NoDocument)?;
        let element: HtmlElement = match &widget.kind {
            DomElementKind::TextArea { placeholder } => {
                let area = document
                    .create_element("textarea")
                    .map_err(js_err)?
                    .dyn_into::<HtmlTextAreaElement>()
                    .map_err(|_| DomError::Host("textarea cast failed".into()))?;
                area.set_placeholder(placeholder);
                area.set_value(&widget.value);
                area.unchecked_into()
            }
            DomElementKind::FileInput { accept } => {
                let input = document
                    .create_element("input")
                    .map_err(js_err)?
                    .dyn_into::<HtmlInputElement>()
                    .map_err(|_| DomError::Host("input cast failed".into()))?;
                input.set_type("file");
                input.set_accept(accept);
                input.unchecked_into()
            }
            DomElementKind::Embed { url } => {
                let frame = document.create_element("iframe").map_err(js_err)?;
                frame.set_attribute("src", url).map_err(js_err)?;
                frame.set_attribute("frameborder", "0").map_err(js_err)?;
                frame
                    .dyn_into::<HtmlElement>()
                    .map_err(|_| DomError::Host("iframe cast failed".into()))?
            }
        };
        let style = element.style();
        style.set_property("position", "absolute").map_err(js_err)?;
        style.set_property("transform-origin", "0 0").map_err(js_err)?;
        style.set_property("box-sizing", "border-box").map_err(js_err)?;
        Ok(element)
    }
}

impl DomHost for WebDomHost {
    type Element = WebElement;

    fn mount(&mut self, key: DomKey, widget: &DomWidget) -> Result<WebElement, DomError> {
        let element = self.create(widget)?;
        self.container.append_child(&element).map_err(js_err)?;

        let signals = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Vec::new();

        let input_event = match widget.kind {
            DomElementKind::FileInput { .. } => "change",
            _ => "input",
        };
        {
            let queue = Rc::clone(&signals);
            let source = element.clone();
            let on_input: Listener = Closure::new(move |_event: Event| {
                let value = if let Some(area) = source.dyn_ref::<HtmlTextAreaElement>() {
                    area.value()
                } else if let Some(input) = source.dyn_ref::<HtmlInputElement>() {
                    input.value()
                } else {
                    return;
                };
                queue.borrow_mut().push(DomSignal::Input(value));
            });
            listeners.push((input_event, on_input));
        }
        for (name, signal) in [("focus", DomSignal::Focus), ("click", DomSignal::Click)] {
            let queue = Rc::clone(&signals);
            let listener: Listener = Closure::new(move |_event: Event| {
                queue.borrow_mut().push(signal.clone());
            });
            listeners.push((name, listener));
        }
        for (name, listener) in &listeners {
            element
                .add_event_listener_with_callback(name, listener.as_ref().unchecked_ref())
                .map_err(js_err)?;
        }

        log::debug!("mounted <{}> for widget {:?}", element.tag_name(), key);
        Ok(WebElement {
            element,
            listeners,
            signals,
        })
    }

    fn apply(&mut self, element: &mut WebElement, _widget: &DomWidget, visibility: &DomVisibility) {
        let el = &element.element;
        let style = el.style();
        let placement = match visibility {
            DomVisibility::Hidden(_) => {
                el.set_hidden(true);
                let _ = style.set_property("display", "none");
                return;
            }
            DomVisibility::Visible(placement) => placement,
        };
        el.set_hidden(false);
        let properties = [
            ("display", String::new()),
            ("transform", placement.css_transform()),
            ("left", format!("{}px", placement.left)),
            ("top", format!("{}px", placement.top)),
            ("width", format!("{}px", placement.width)),
            ("height", format!("{}px", placement.height)),
            ("z-index", placement.z_index.to_string()),
            (
                "clip-path",
                placement.clip.map(|c| c.to_css()).unwrap_or_default(),
            ),
            ("opacity", if placement.dimmed { "0.5" } else { "1" }.to_string()),
            (
                "pointer-events",
                if placement.dimmed { "none" } else { "" }.to_string(),
            ),
        ];
        for (name, value) in properties {
            if let Err(err) = style.set_property(name, &value) {
                log::warn!("could not set `{name}` on DOM widget: {err:?}");
            }
        }
    }

    fn poll(&mut self, element: &mut WebElement) -> Vec<DomSignal> {
        element.signals.borrow_mut().drain(..).collect()
    }

    fn unmount(&mut self, element: WebElement) {
        for (name, listener) in &element.listeners {
            let _ = element
                .element
                .remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref());
        }
        element.element.remove();
    }
}
