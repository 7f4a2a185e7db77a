use std::any::Any;

/// Best-effort text of a caught panic payload, for logging.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
  if let Some(msg) = payload.downcast_ref::<&'static str>() {
    msg
  } else if let Some(msg) = payload.downcast_ref::<String>() {
    msg.as_str()
  } else {
    "<non-string panic payload>"
  }
}
