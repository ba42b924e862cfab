use crate::session::messages::Msg;
use crate::widget::input::KeyEvent;

/// Global key bindings; the caller skips this while a text field has focus
pub fn handle_key_event(key: &KeyEvent) -> Option<Msg> {
    match key {
        KeyEvent::Escape => Some(Msg::Exit),
        KeyEvent::Enter => Some(Msg::CropAndNext),
        KeyEvent::Char('.') => Some(Msg::ZoomIn),
        KeyEvent::Char(',') => Some(Msg::ZoomOut),
        KeyEvent::Char('x') => Some(Msg::Delete),
        KeyEvent::Char('r') => Some(Msg::Reset),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings() {
        assert_eq!(handle_key_event(&KeyEvent::Escape), Some(Msg::Exit));
        assert_eq!(handle_key_event(&KeyEvent::Enter), Some(Msg::CropAndNext));
        assert_eq!(handle_key_event(&KeyEvent::Char('.')), Some(Msg::ZoomIn));
        assert_eq!(handle_key_event(&KeyEvent::Char(',')), Some(Msg::ZoomOut));
        assert_eq!(handle_key_event(&KeyEvent::Char('x')), Some(Msg::Delete));
        assert_eq!(handle_key_event(&KeyEvent::Char('r')), Some(Msg::Reset));
        assert_eq!(handle_key_event(&KeyEvent::Char('q')), None);
        assert_eq!(handle_key_event(&KeyEvent::Backspace), None);
    }
}
