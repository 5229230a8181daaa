//! Per-frame input snapshot
//!
//! The host turns window events into `InputEvent`s and feeds them to an
//! `InputTracker`, which folds them into the `Input` snapshot handed to the
//! game once per frame. Nothing here knows about SDL.

/// Keys the framework tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    P,
    Space,
    Escape,
}

impl Key {
    pub const COUNT: usize = 7;

    pub const ALL: [Key; Key::COUNT] = [
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::P,
        Key::Space,
        Key::Escape,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButtonKind {
    Left,
    Right,
}

/// Window events after translation from the platform layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    KeyDown(Key),
    KeyUp(Key),
    MouseMove { x: i32, y: i32 },
    MouseDown { x: i32, y: i32, button: MouseButtonKind },
    MouseUp { x: i32, y: i32, button: MouseButtonKind },
}

/// `is_pressed` is true only on the frame the button went from up to down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub is_down: bool,
    pub is_pressed: bool,
}

impl ButtonState {
    #[inline]
    fn press(&mut self) {
        // Key repeat delivers extra downs while held; those are not presses
        if !self.is_down {
            self.is_pressed = true;
        }
        self.is_down = true;
    }

    #[inline]
    fn release(&mut self) {
        self.is_down = false;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keyboard {
    keys: [ButtonState; Key::COUNT],
}

impl Keyboard {
    #[inline]
    pub fn key(&self, key: Key) -> ButtonState {
        self.keys[key.index()]
    }

    #[inline]
    pub fn is_down(&self, key: Key) -> bool {
        self.key(key).is_down
    }

    #[inline]
    pub fn is_pressed(&self, key: Key) -> bool {
        self.key(key).is_pressed
    }
}

/// Cursor in window pixels, origin top-left, y down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mouse {
    pub x: i32,
    pub y: i32,
    pub left: ButtonState,
    pub right: ButtonState,
}

impl Mouse {
    fn button_mut(&mut self, button: MouseButtonKind) -> &mut ButtonState {
        match button {
            MouseButtonKind::Left => &mut self.left,
            MouseButtonKind::Right => &mut self.right,
        }
    }
}

/// Everything the game sees of the outside world for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Input {
    /// Frame delta in seconds
    pub dt: f32,
    pub keyboard: Keyboard,
    pub mouse: Mouse,
}

/// Accumulates events between frames into an `Input`
#[derive(Debug, Default)]
pub struct InputTracker {
    input: Input,
    quit_requested: bool,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start collecting a new frame: edge flags from the last frame are
    /// dropped, held state carries over.
    pub fn begin_frame(&mut self, dt: f32) {
        self.input.dt = dt;
        for key in &mut self.input.keyboard.keys {
            key.is_pressed = false;
        }
        self.input.mouse.left.is_pressed = false;
        self.input.mouse.right.is_pressed = false;
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Quit => self.quit_requested = true,
            InputEvent::KeyDown(key) => self.input.keyboard.keys[key.index()].press(),
            InputEvent::KeyUp(key) => self.input.keyboard.keys[key.index()].release(),
            InputEvent::MouseMove { x, y } => {
                self.input.mouse.x = x;
                self.input.mouse.y = y;
            },
            InputEvent::MouseDown { x, y, button } => {
                self.input.mouse.x = x;
                self.input.mouse.y = y;
                self.input.mouse.button_mut(button).press();
            },
            InputEvent::MouseUp { x, y, button } => {
                self.input.mouse.x = x;
                self.input.mouse.y = y;
                self.input.mouse.button_mut(button).release();
            },
        }
    }

    #[inline]
    pub fn input(&self) -> &Input {
        &self.input
    }

    #[inline]
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}
