//! Platform-agnostic input handling: host events in, body forces and orbit
//! gestures out.

use glam::Vec3;

use crate::config::{ForceRelease, InputConfig};
use crate::controller::physics::PhysicsWorld;
use crate::model::registry::ObjectRegistry;

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Physical key code in the web `KeyboardEvent.code` vocabulary.
    KeyDown(String),
    KeyUp(String),

    PointerDown { button: MouseButton },
    PointerUp { button: MouseButton },
    PointerMove { dx: f32, dy: f32 },
    Wheel { delta_y: f32 },

    FocusLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Self {
        match button {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyBinding {
    pub code: String,
    pub force: Vec3,
}

/// Maps key presses to forces on the controlled body.
///
/// A press overwrites the body's force on every axis the binding's force is
/// non-zero on; other axes keep their value. Repeated presses therefore
/// never push past the configured magnitude.
#[derive(Debug, Clone)]
pub struct InputController {
    bindings: Vec<KeyBinding>,
    release: ForceRelease,
}

impl InputController {
    pub fn new(bindings: Vec<KeyBinding>, release: ForceRelease) -> Self {
        Self { bindings, release }
    }

    pub fn from_config(config: &InputConfig) -> Self {
        let bindings = config
            .bindings
            .iter()
            .map(|b| KeyBinding {
                code: b.code.clone(),
                force: Vec3::from_array(b.direction) * config.force_magnitude,
            })
            .collect();
        Self::new(bindings, config.release)
    }

    pub fn release_policy(&self) -> ForceRelease {
        self.release
    }

    pub fn binding(&self, code: &str) -> Option<&KeyBinding> {
        self.bindings.iter().find(|b| b.code == code)
    }

    /// Returns true if the key was recognized and a force was assigned.
    pub fn key_down(&self, code: &str, registry: &ObjectRegistry, world: &mut PhysicsWorld) -> bool {
        let Some(binding) = self.binding(code) else {
            return false;
        };
        let Some(target) = registry.controlled() else {
            tracing::debug!(code, "no controlled object, ignoring key");
            return false;
        };
        let Some(current) = world.force(target.body) else {
            return false;
        };
        let force = overwrite_axes(current, binding.force, binding.force);
        tracing::debug!(code, ?force, "assigning force");
        world.set_force(target.body, force)
    }

    /// Under [`ForceRelease::OnKeyUp`] zeroes the axes the key had set.
    /// Returns true if the force changed.
    pub fn key_up(&self, code: &str, registry: &ObjectRegistry, world: &mut PhysicsWorld) -> bool {
        if self.release != ForceRelease::OnKeyUp {
            return false;
        }
        let (Some(binding), Some(target)) = (self.binding(code), registry.controlled()) else {
            return false;
        };
        let Some(current) = world.force(target.body) else {
            return false;
        };
        let force = overwrite_axes(current, binding.force, Vec3::ZERO);
        world.set_force(target.body, force)
    }
}

/// Replaces the components of `current` selected by the non-zero
/// components of `mask` with the matching components of `value`.
fn overwrite_axes(current: Vec3, mask: Vec3, value: Vec3) -> Vec3 {
    let pick = |c: f32, m: f32, v: f32| if m != 0.0 { v } else { c };
    Vec3::new(
        pick(current.x, mask.x, value.x),
        pick(current.y, mask.y, value.y),
        pick(current.z, mask.z, value.z),
    )
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{Event, KeyboardEvent, MouseEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let code = e.code();
        if is_down {
            InputEvent::KeyDown(code)
        } else {
            InputEvent::KeyUp(code)
        }
    }

    pub fn mouse_button_to_input(e: &MouseEvent, is_down: bool) -> InputEvent {
        let button = MouseButton::from_web_button(e.button());
        if is_down {
            InputEvent::PointerDown { button }
        } else {
            InputEvent::PointerUp { button }
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::PointerMove {
            dx: e.movement_x() as f32,
            dy: e.movement_y() as f32,
        }
    }

    pub fn mouse_wheel_to_input(e: &Event) -> Option<InputEvent> {
        let js_val = wasm_bindgen::JsValue::from(e.clone());
        if let Ok(delta_y) = js_sys::Reflect::get(&js_val, &wasm_bindgen::JsValue::from_str("deltaY")) {
            if let Some(dy) = delta_y.as_f64() {
                return Some(InputEvent::Wheel { delta_y: dy as f32 });
            }
        }
        None
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub mod native {
    use super::*;
    use winit::event::{ElementState, KeyEvent, MouseScrollDelta};
    use winit::keyboard::PhysicalKey;

    /// winit's `KeyCode` debug names match the web `code` strings for the
    /// keys we bind ("KeyW", "ArrowUp", ...).
    pub fn key_event_to_input(e: &KeyEvent) -> Option<InputEvent> {
        let PhysicalKey::Code(code) = e.physical_key else {
            return None;
        };
        let code = format!("{code:?}");
        Some(match e.state {
            ElementState::Pressed => InputEvent::KeyDown(code),
            ElementState::Released => InputEvent::KeyUp(code),
        })
    }

    pub fn mouse_button_to_input(
        state: ElementState,
        button: winit::event::MouseButton,
    ) -> Option<InputEvent> {
        let button = match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            _ => return None,
        };
        Some(match state {
            ElementState::Pressed => InputEvent::PointerDown { button },
            ElementState::Released => InputEvent::PointerUp { button },
        })
    }

    /// Wheel up is negative `delta_y`, as in the browser.
    pub fn mouse_wheel_to_input(delta: MouseScrollDelta) -> InputEvent {
        let delta_y = match delta {
            MouseScrollDelta::LineDelta(_, y) => -y,
            MouseScrollDelta::PixelDelta(p) => -(p.y as f32),
        };
        InputEvent::Wheel { delta_y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContactConfig;
    use crate::controller::physics::{BodyDesc, BodyHandle};
    use crate::model::scene::NodeId;

    fn setup() -> (PhysicsWorld, ObjectRegistry, BodyHandle, BodyHandle) {
        let mut world = PhysicsWorld::new(Vec3::new(0.0, -9.82, 0.0), ContactConfig::default());
        let first = world.add_body(&BodyDesc::sphere(0.5, 1.0, Vec3::new(1.0, 2.0, 0.0)));
        let second = world.add_body(&BodyDesc::sphere(0.5, 1.0, Vec3::new(-1.0, 2.0, 0.0)));
        let mut registry = ObjectRegistry::new();
        let id = registry.add_dynamic_object(NodeId(0), first);
        registry.add_dynamic_object(NodeId(1), second);
        registry.set_controlled(id);
        (world, registry, first, second)
    }

    #[test]
    fn test_w_and_s_set_fixed_force() {
        let (mut world, registry, first, second) = setup();
        let input = InputController::from_config(&InputConfig::default());

        assert!(input.key_down("KeyW", &registry, &mut world));
        assert_eq!(world.force(first), Some(Vec3::new(150.0, 0.0, 0.0)));

        assert!(input.key_down("KeyS", &registry, &mut world));
        assert_eq!(world.force(first), Some(Vec3::new(-150.0, 0.0, 0.0)));

        assert!(!input.key_down("KeyQ", &registry, &mut world));
        assert_eq!(world.force(first), Some(Vec3::new(-150.0, 0.0, 0.0)));

        assert_eq!(world.force(second), Some(Vec3::ZERO));
    }

    #[test]
    fn test_repeated_press_does_not_accumulate() {
        let (mut world, registry, first, _) = setup();
        let input = InputController::from_config(&InputConfig::default());
        for _ in 0..10 {
            input.key_down("KeyW", &registry, &mut world);
        }
        assert_eq!(world.force(first), Some(Vec3::new(150.0, 0.0, 0.0)));
    }

    #[test]
    fn test_other_axes_are_preserved() {
        let (mut world, registry, first, _) = setup();
        let input = InputController::new(
            vec![
                KeyBinding { code: "KeyW".into(), force: Vec3::new(150.0, 0.0, 0.0) },
                KeyBinding { code: "KeyD".into(), force: Vec3::new(0.0, 0.0, 150.0) },
            ],
            ForceRelease::Sustain,
        );
        input.key_down("KeyW", &registry, &mut world);
        input.key_down("KeyD", &registry, &mut world);
        assert_eq!(world.force(first), Some(Vec3::new(150.0, 0.0, 150.0)));
    }

    #[test]
    fn test_sustain_keeps_force_after_key_up() {
        let (mut world, registry, first, _) = setup();
        let input = InputController::from_config(&InputConfig::default());
        input.key_down("KeyW", &registry, &mut world);
        assert!(!input.key_up("KeyW", &registry, &mut world));
        assert_eq!(world.force(first), Some(Vec3::new(150.0, 0.0, 0.0)));
    }

    #[test]
    fn test_on_key_up_zeroes_bound_axes() {
        let (mut world, registry, first, _) = setup();
        let config = InputConfig { release: ForceRelease::OnKeyUp, ..InputConfig::default() };
        let input = InputController::from_config(&config);
        input.key_down("KeyW", &registry, &mut world);
        assert!(input.key_up("KeyW", &registry, &mut world));
        assert_eq!(world.force(first), Some(Vec3::ZERO));
        assert!(!input.key_up("KeyQ", &registry, &mut world));
    }

    #[test]
    fn test_without_controlled_object_keys_are_ignored() {
        let mut world = PhysicsWorld::new(Vec3::ZERO, ContactConfig::default());
        let body = world.add_body(&BodyDesc::sphere(0.5, 1.0, Vec3::ZERO));
        let mut registry = ObjectRegistry::new();
        registry.add_dynamic_object(NodeId(0), body);
        let input = InputController::from_config(&InputConfig::default());
        assert!(!input.key_down("KeyW", &registry, &mut world));
        assert_eq!(world.force(body), Some(Vec3::ZERO));
    }

    #[test]
    fn test_web_button_mapping() {
        assert_eq!(MouseButton::from_web_button(0), MouseButton::Left);
        assert_eq!(MouseButton::from_web_button(1), MouseButton::Middle);
        assert_eq!(MouseButton::from_web_button(2), MouseButton::Right);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_native_wheel_matches_browser_sign() {
        use winit::event::MouseScrollDelta;
        let up = native::mouse_wheel_to_input(MouseScrollDelta::LineDelta(0.0, 1.0));
        assert_eq!(up, InputEvent::Wheel { delta_y: -1.0 });
        assert_eq!(
            native::mouse_button_to_input(
                winit::event::ElementState::Pressed,
                winit::event::MouseButton::Left
            ),
            Some(InputEvent::PointerDown { button: MouseButton::Left })
        );
    }
}
