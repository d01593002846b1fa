use std::collections::HashSet;

use super::types::{ButtonState, InputEvent, Key, Modifiers, MouseButton, PointerButtonEvent};

/// Current input state for the window: held keys/buttons and pointer position.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,

    /// Pointer position in physical pixels.
    pub pointer_pos: Option<(f32, f32)>,

    pub keys_down: HashSet<Key>,
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Folds one event into the held state.
    pub fn apply_event(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::ModifiersChanged(m) => self.modifiers = *m,

            InputEvent::Focused(f) => {
                self.focused = *f;
                // Releases are not delivered while unfocused.
                if !*f {
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved { x, y } => self.pointer_pos = Some((*x, *y)),

            InputEvent::PointerLeft => self.pointer_pos = None,

            InputEvent::Key {
                key,
                state,
                modifiers,
                ..
            } => {
                self.modifiers = *modifiers;
                match state {
                    ButtonState::Pressed => {
                        self.keys_down.insert(*key);
                    }
                    ButtonState::Released => {
                        self.keys_down.remove(key);
                    }
                }
            }

            InputEvent::PointerButton(PointerButtonEvent {
                button,
                state,
                x,
                y,
                modifiers,
            }) => {
                self.pointer_pos = Some((*x, *y));
                self.modifiers = *modifiers;
                match state {
                    ButtonState::Pressed => {
                        self.buttons_down.insert(*button);
                    }
                    ButtonState::Released => {
                        self.buttons_down.remove(button);
                    }
                }
            }

            InputEvent::MouseWheel { modifiers, .. } => self.modifiers = *modifiers,
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(button: MouseButton, state: ButtonState) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent {
            button,
            state,
            x: 10.0,
            y: 20.0,
            modifiers: Modifiers::default(),
        })
    }

    #[test]
    fn button_press_and_release_tracks_held_set() {
        let mut st = InputState::default();
        st.apply_event(&press(MouseButton::Left, ButtonState::Pressed));
        assert!(st.button_down(MouseButton::Left));
        assert_eq!(st.pointer_pos, Some((10.0, 20.0)));

        st.apply_event(&press(MouseButton::Left, ButtonState::Released));
        assert!(!st.button_down(MouseButton::Left));
    }

    #[test]
    fn focus_loss_clears_held_state() {
        let mut st = InputState::default();
        st.apply_event(&press(MouseButton::Right, ButtonState::Pressed));
        st.apply_event(&InputEvent::Key {
            key: Key::Char('R'),
            state: ButtonState::Pressed,
            modifiers: Modifiers::default(),
            repeat: false,
        });
        st.apply_event(&InputEvent::Focused(false));
        assert!(st.buttons_down.is_empty());
        assert!(st.keys_down.is_empty());
    }

    #[test]
    fn pointer_left_forgets_position() {
        let mut st = InputState::default();
        st.apply_event(&InputEvent::PointerMoved { x: 1.0, y: 2.0 });
        st.apply_event(&InputEvent::PointerLeft);
        assert_eq!(st.pointer_pos, None);
    }
}
