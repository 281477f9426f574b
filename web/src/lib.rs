//! `MOTDPlayer` for page scripts.
//!
//! ```js
//! const player = new MOTDPlayer(b64InitString);
//! player.post({ name: "Bob" }, reply => { ... }, err => { ... });
//! ```
//!
//! Errors reach the error callbacks as the protocol's sentinel strings
//! (`JS_AJAX_FAILURE`, `"ERROR_VIEW Invalid Auth."`, ...).

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use js_sys::{Function, Reflect};
use motd_protocol::{
	ClientRequest, Failure, JSON_CONTENT_TYPE, Reply, SessionDescriptor, parse_reply,
};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
	CloseEvent, Element, Event, Headers, MessageEvent, Request, RequestInit, Response, WebSocket,
};

const LOADING_SCREEN_CLASS: &str = "motdplayer-ajax-loading-screen";

#[wasm_bindgen(start)]
pub fn start() {
	console_error_panic_hook::set_once();
}

struct Socket {
	ws: WebSocket,
	_onopen: Closure<dyn FnMut()>,
	_onmessage: Closure<dyn FnMut(MessageEvent)>,
	_onclose: Closure<dyn FnMut(CloseEvent)>,
	_onerror: Closure<dyn FnMut(Event)>,
}

struct Inner {
	descriptor: RefCell<SessionDescriptor>,
	socket: RefCell<Option<Socket>>,
	pending: Cell<usize>,
	loading_screen: RefCell<Option<Element>>,
}

impl Inner {
	/// Detaches the handlers and closes the socket. No close callback fires.
	fn close_socket(&self) {
		let Some(socket) = self.socket.borrow_mut().take() else {
			return;
		};
		socket.ws.set_onopen(None);
		socket.ws.set_onmessage(None);
		socket.ws.set_onclose(None);
		socket.ws.set_onerror(None);
		let _ = socket.ws.close();
		// May be running inside one of its own handlers; drop it afterwards.
		spawn_local(async move { drop(socket) });
	}

	fn show_loading_screen(&self) {
		if self.loading_screen.borrow().is_some() {
			return;
		}
		let Some(document) = web_sys::window().and_then(|w| w.document()) else {
			return;
		};
		let Some(body) = document.body() else {
			return;
		};
		let Ok(node) = document.create_element("div") else {
			return;
		};
		let _ = node.class_list().add_1(LOADING_SCREEN_CLASS);
		if body.append_child(&node).is_ok() {
			*self.loading_screen.borrow_mut() = Some(node);
		}
	}

	fn hide_loading_screen(&self) {
		if let Some(node) = self.loading_screen.borrow_mut().take() {
			node.remove();
		}
	}
}

/// One in-flight HTTP request. The loading screen stays up while any exist.
struct Pending(Rc<Inner>);

impl Pending {
	fn begin(inner: &Rc<Inner>) -> Self {
		let count = inner.pending.get();
		inner.pending.set(count + 1);
		if count == 0 {
			inner.show_loading_screen();
		}
		Pending(Rc::clone(inner))
	}
}

impl Drop for Pending {
	fn drop(&mut self) {
		let count = self.0.pending.get().saturating_sub(1);
		self.0.pending.set(count);
		if count == 0 {
			self.0.hide_loading_screen();
		}
	}
}

#[wasm_bindgen(js_name = MOTDPlayer)]
pub struct MotdPlayer {
	inner: Rc<Inner>,
}

#[wasm_bindgen(js_class = MOTDPlayer)]
impl MotdPlayer {
	/// Throws if the init string is not a base64 session descriptor.
	#[wasm_bindgen(constructor)]
	pub fn new(b64_init_string: &str) -> Result<MotdPlayer, JsError> {
		let descriptor = SessionDescriptor::from_init_string(b64_init_string)
			.map_err(|err| JsError::new(&err.to_string()))?;
		Ok(MotdPlayer {
			inner: Rc::new(Inner {
				descriptor: RefCell::new(descriptor),
				socket: RefCell::new(None),
				pending: Cell::new(0),
				loading_screen: RefCell::new(None),
			}),
		})
	}

	/// Sends `data` to the page's handler. `onSuccess` gets the handler's
	/// reply, `onError` a sentinel string.
	pub fn post(
		&self,
		data: JsValue,
		on_success: Option<Function>,
		on_error: Option<Function>,
	) -> Result<(), JsError> {
		let payload = from_js(data)?;
		let path = self.inner.descriptor.borrow().page_route();
		let inner = Rc::clone(&self.inner);

		let pending = Pending::begin(&inner);

		spawn_local(async move {
			let outcome = exchange(&path, ClientRequest::custom_data(payload)).await;
			drop(pending);
			match outcome {
				Ok((token, custom_data)) => {
					inner.descriptor.borrow_mut().rotate(token);
					// A reply without `custom_data` reaches the page as `undefined`.
					let arg = custom_data.map_or(JsValue::UNDEFINED, |data| to_js(&data));
					invoke(&on_success, &arg);
				}
				Err(failure) => invoke(&on_error, &failure.code().into()),
			}
		});
		Ok(())
	}

	/// Asks the server to move the session to `newPageId`. An open
	/// WebSocket keeps the page it was opened with.
	#[wasm_bindgen(js_name = switchPage)]
	pub fn switch_page(
		&self,
		new_page_id: String,
		on_success: Option<Function>,
		on_error: Option<Function>,
	) {
		let path = self.inner.descriptor.borrow().switch_route(&new_page_id);
		let inner = Rc::clone(&self.inner);

		let pending = Pending::begin(&inner);

		spawn_local(async move {
			let outcome = exchange(&path, ClientRequest::Switch).await;
			drop(pending);
			match outcome {
				Ok((token, _)) => {
					{
						let mut descriptor = inner.descriptor.borrow_mut();
						descriptor.rotate(token);
						descriptor.commit_page(new_page_id);
					}
					invoke(&on_success, &JsValue::UNDEFINED);
				}
				Err(failure) => invoke(&on_error, &failure.code().into()),
			}
		});
	}

	/// Opens the session's WebSocket.
	///
	/// `onSuccess` fires when the server accepts the connection, `onMessage`
	/// with each pushed payload, `onClose` when the server or network closes
	/// it, and `onError` with a sentinel string.
	#[wasm_bindgen(js_name = openWSConnection)]
	pub fn open_ws_connection(
		&self,
		on_success: Option<Function>,
		on_message: Option<Function>,
		on_close: Option<Function>,
		on_error: Option<Function>,
	) {
		if self.inner.socket.borrow().is_some() {
			invoke(&on_error, &Failure::WsAlreadyOpened.code().into());
			return;
		}
		if !self.is_ws_supported() {
			invoke(&on_error, &Failure::WsUnsupported.code().into());
			return;
		}

		let route = self.inner.descriptor.borrow().ws_route();
		let ws = match ws_url(&route).and_then(|url| WebSocket::new(&url)) {
			Ok(ws) => ws,
			Err(err) => {
				web_sys::console::error_2(&"motd: websocket failed to open".into(), &err);
				invoke(&on_error, &Failure::WsTransport.code().into());
				return;
			}
		};

		let weak = Rc::downgrade(&self.inner);

		let onopen = Closure::<dyn FnMut()>::new(|| {
			web_sys::console::debug_1(&"motd: websocket open".into());
		});

		let onmessage = {
			let weak = Weak::clone(&weak);
			let on_error = on_error.clone();
			Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
				let Some(inner) = weak.upgrade() else {
					return;
				};
				let Some(text) = event.data().as_string() else {
					return;
				};
				match parse_reply(&text) {
					Ok(Reply::Authenticated { token, .. }) => {
						inner.descriptor.borrow_mut().rotate(token);
						invoke(&on_success, &JsValue::UNDEFINED);
					}
					Ok(Reply::CustomData(data)) => invoke(&on_message, &to_js(&data)),
					Ok(Reply::Rejected(failure)) | Err(failure) => {
						invoke(&on_error, &failure.code().into())
					}
				}
			})
		};

		let onclose = {
			let weak = Weak::clone(&weak);
			Closure::<dyn FnMut(CloseEvent)>::new(move |_: CloseEvent| {
				if let Some(inner) = weak.upgrade() {
					inner.close_socket();
				}
				invoke(&on_close, &JsValue::UNDEFINED);
			})
		};

		let onerror = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
			invoke(&on_error, &Failure::WsTransport.code().into());
		});

		ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
		ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
		ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
		ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));

		*self.inner.socket.borrow_mut() = Some(Socket {
			ws,
			_onopen: onopen,
			_onmessage: onmessage,
			_onclose: onclose,
			_onerror: onerror,
		});
	}

	/// Closes the WebSocket without firing `onClose`. No-op without one.
	#[wasm_bindgen(js_name = closeWSConnection)]
	pub fn close_ws_connection(&self) {
		self.inner.close_socket();
	}

	/// Sends `data` as custom data over the open WebSocket. No-op without one.
	#[wasm_bindgen(js_name = sendWSData)]
	pub fn send_ws_data(&self, data: JsValue) -> Result<(), JsError> {
		let socket = self.inner.socket.borrow();
		let Some(socket) = socket.as_ref() else {
			return Ok(());
		};
		let body = ClientRequest::custom_data(from_js(data)?).to_json();
		if let Err(err) = socket.ws.send_with_str(&body) {
			web_sys::console::warn_2(&"motd: websocket send failed".into(), &err);
		}
		Ok(())
	}

	#[wasm_bindgen(js_name = isWSSupported)]
	pub fn is_ws_supported(&self) -> bool {
		web_sys::window()
			.and_then(|window| Reflect::has(&window, &"WebSocket".into()).ok())
			.unwrap_or(false)
	}

	/// Navigates to the current page with the current token.
	#[wasm_bindgen(js_name = reloadPage)]
	pub fn reload_page(&self) -> Result<(), JsValue> {
		let window = web_sys::window().ok_or("no window")?;
		window
			.location()
			.set_href(&self.inner.descriptor.borrow().page_route())
	}

	#[wasm_bindgen(js_name = getPlayerSteamID64)]
	pub fn player_steam_id64(&self) -> String {
		self.inner.descriptor.borrow().steam_id.clone()
	}

	#[wasm_bindgen(js_name = getPageId)]
	pub fn page_id(&self) -> String {
		self.inner.descriptor.borrow().page_id.clone()
	}
}

impl Drop for MotdPlayer {
	fn drop(&mut self) {
		self.inner.close_socket();
	}
}

/// POSTs one request and reads the exchange outcome.
async fn exchange(
	path: &str,
	request: ClientRequest,
) -> Result<(String, Option<Value>), Failure> {
	let text = post_json(path, request.to_json()).await.map_err(|err| {
		web_sys::console::warn_2(&"motd: request failed".into(), &err);
		Failure::HttpTransport
	})?;
	parse_reply(&text).and_then(Reply::into_exchange)
}

/// Returns the body of a 200 response; anything else is an error.
async fn post_json(path: &str, body: String) -> Result<String, JsValue> {
	let window = web_sys::window().ok_or("no window")?;

	let headers = Headers::new()?;
	headers.set("Content-Type", JSON_CONTENT_TYPE)?;

	let init = RequestInit::new();
	init.set_method("POST");
	init.set_headers(&headers);
	init.set_body(&JsValue::from_str(&body));

	let request = Request::new_with_str_and_init(path, &init)?;
	let response: Response = JsFuture::from(window.fetch_with_request(&request))
		.await?
		.dyn_into()?;
	if response.status() != 200 {
		return Err(JsValue::from_str(&format!("http status {}", response.status())));
	}

	JsFuture::from(response.text()?)
		.await?
		.as_string()
		.ok_or_else(|| JsValue::from_str("response body is not text"))
}

/// WebSocket URL on the page's own host, `wss` on https pages.
fn ws_url(path: &str) -> Result<String, JsValue> {
	let location = web_sys::window().ok_or("no window")?.location();
	let scheme = if location.protocol()? == "https:" {
		"wss"
	} else {
		"ws"
	};
	Ok(format!("{scheme}://{}{path}", location.host()?))
}

fn from_js(value: JsValue) -> Result<Value, JsError> {
	serde_wasm_bindgen::from_value(value).map_err(|err| JsError::new(&err.to_string()))
}

/// Plain JS objects rather than `Map`s, like `JSON.parse` would give.
fn to_js(value: &Value) -> JsValue {
	value
		.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
		.unwrap_or(JsValue::NULL)
}

fn invoke(callback: &Option<Function>, arg: &JsValue) {
	let Some(callback) = callback else {
		return;
	};
	if let Err(err) = callback.call1(&JsValue::NULL, arg) {
		web_sys::console::error_2(&"motd: callback threw".into(), &err);
	}
}
