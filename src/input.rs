//! Pointer injection backends.
//!
//! The engine only talks to [`InputInjector`]. Windows gets a `SendInput`
//! backend; elsewhere the default backend logs what it would have done.

use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedAction {
    MoveTo(i32, i32),
    Click,
    DoubleClick,
    Scroll(i32),
}

impl InjectedAction {
    pub fn name(&self) -> &'static str {
        match self {
            InjectedAction::MoveTo(..) => "move",
            InjectedAction::Click => "click",
            InjectedAction::DoubleClick => "double click",
            InjectedAction::Scroll(_) => "scroll",
        }
    }
}

pub trait InputInjector: Send + Sync {
    fn move_to(&self, x: i32, y: i32) -> anyhow::Result<()>;
    fn click(&self) -> anyhow::Result<()>;
    fn double_click(&self) -> anyhow::Result<()>;
    /// Positive amounts scroll up.
    fn scroll(&self, amount: i32) -> anyhow::Result<()>;

    fn cursor_position(&self) -> Option<(i32, i32)> {
        None
    }

    fn perform(&self, action: InjectedAction) -> anyhow::Result<()> {
        match action {
            InjectedAction::MoveTo(x, y) => self.move_to(x, y),
            InjectedAction::Click => self.click(),
            InjectedAction::DoubleClick => self.double_click(),
            InjectedAction::Scroll(amount) => self.scroll(amount),
        }
    }
}

/// Logs actions instead of performing them.
#[derive(Debug, Default)]
pub struct DryRunInjector;

impl InputInjector for DryRunInjector {
    fn move_to(&self, x: i32, y: i32) -> anyhow::Result<()> {
        tracing::debug!(x, y, "dry run: move");
        Ok(())
    }

    fn click(&self) -> anyhow::Result<()> {
        tracing::info!("dry run: click");
        Ok(())
    }

    fn double_click(&self) -> anyhow::Result<()> {
        tracing::info!("dry run: double click");
        Ok(())
    }

    fn scroll(&self, amount: i32) -> anyhow::Result<()> {
        tracing::debug!(amount, "dry run: scroll");
        Ok(())
    }
}

#[cfg(windows)]
#[derive(Debug, Default)]
pub struct SendInputInjector;

#[cfg(windows)]
impl SendInputInjector {
    fn send_mouse(
        events: &[(
            windows::Win32::UI::Input::KeyboardAndMouse::MOUSE_EVENT_FLAGS,
            i32,
        )],
    ) -> anyhow::Result<()> {
        use windows::Win32::UI::Input::KeyboardAndMouse::{
            SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEINPUT,
        };

        let inputs: Vec<INPUT> = events
            .iter()
            .map(|(flags, data)| INPUT {
                r#type: INPUT_MOUSE,
                Anonymous: INPUT_0 {
                    mi: MOUSEINPUT {
                        dx: 0,
                        dy: 0,
                        mouseData: *data as _,
                        dwFlags: *flags,
                        time: 0,
                        dwExtraInfo: 0,
                    },
                },
            })
            .collect();

        let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            anyhow::bail!(
                "SendInput injected {} of {} events: {}",
                sent,
                inputs.len(),
                windows::core::Error::from_win32()
            );
        }
        Ok(())
    }
}

#[cfg(windows)]
impl InputInjector for SendInputInjector {
    fn move_to(&self, x: i32, y: i32) -> anyhow::Result<()> {
        use windows::Win32::UI::WindowsAndMessaging::SetCursorPos;
        unsafe { SetCursorPos(x, y) }?;
        Ok(())
    }

    fn click(&self) -> anyhow::Result<()> {
        use windows::Win32::UI::Input::KeyboardAndMouse::{
            MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
        };
        Self::send_mouse(&[(MOUSEEVENTF_LEFTDOWN, 0), (MOUSEEVENTF_LEFTUP, 0)])
    }

    fn double_click(&self) -> anyhow::Result<()> {
        use windows::Win32::UI::Input::KeyboardAndMouse::{
            MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
        };
        Self::send_mouse(&[
            (MOUSEEVENTF_LEFTDOWN, 0),
            (MOUSEEVENTF_LEFTUP, 0),
            (MOUSEEVENTF_LEFTDOWN, 0),
            (MOUSEEVENTF_LEFTUP, 0),
        ])
    }

    fn scroll(&self, amount: i32) -> anyhow::Result<()> {
        use windows::Win32::UI::Input::KeyboardAndMouse::MOUSEEVENTF_WHEEL;
        Self::send_mouse(&[(MOUSEEVENTF_WHEEL, amount)])
    }

    fn cursor_position(&self) -> Option<(i32, i32)> {
        use windows::Win32::Foundation::POINT;
        use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

        let mut point = POINT { x: 0, y: 0 };
        if unsafe { GetCursorPos(&mut point).is_ok() } {
            Some((point.x, point.y))
        } else {
            None
        }
    }
}

/// The platform's real injector, or [`DryRunInjector`] where none exists.
pub fn default_injector() -> Box<dyn InputInjector> {
    #[cfg(windows)]
    {
        Box::new(SendInputInjector)
    }

    #[cfg(not(windows))]
    {
        tracing::warn!("no input injection backend on this platform, running dry");
        Box::new(DryRunInjector)
    }
}

/// Records every action. Clones share state, so a test can keep a handle
/// while the engine owns the boxed injector.
#[derive(Debug, Clone, Default)]
pub struct MockInputInjector {
    state: Arc<Mutex<MockInjectorState>>,
}

#[derive(Debug, Default)]
struct MockInjectorState {
    performed: Vec<InjectedAction>,
    attempts: usize,
    failure: Option<String>,
    cursor: Option<(i32, i32)>,
}

impl MockInputInjector {
    /// Every call fails with `reason` until cleared with `None`.
    pub fn set_failure(&self, reason: Option<&str>) {
        if let Ok(mut guard) = self.state.lock() {
            guard.failure = reason.map(str::to_string);
        }
    }

    pub fn performed(&self) -> Vec<InjectedAction> {
        self.state
            .lock()
            .map(|guard| guard.performed.clone())
            .unwrap_or_default()
    }

    pub fn attempts(&self) -> usize {
        self.state.lock().map(|guard| guard.attempts).unwrap_or(0)
    }

    pub fn count(&self, pred: impl Fn(&InjectedAction) -> bool) -> usize {
        self.performed().iter().filter(|a| pred(a)).count()
    }

    fn record(&self, action: InjectedAction) -> anyhow::Result<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("mock injector lock poisoned"))?;
        guard.attempts += 1;
        if let Some(reason) = guard.failure.clone() {
            anyhow::bail!(reason);
        }
        if let InjectedAction::MoveTo(x, y) = action {
            guard.cursor = Some((x, y));
        }
        guard.performed.push(action);
        Ok(())
    }
}

impl InputInjector for MockInputInjector {
    fn move_to(&self, x: i32, y: i32) -> anyhow::Result<()> {
        self.record(InjectedAction::MoveTo(x, y))
    }

    fn click(&self) -> anyhow::Result<()> {
        self.record(InjectedAction::Click)
    }

    fn double_click(&self) -> anyhow::Result<()> {
        self.record(InjectedAction::DoubleClick)
    }

    fn scroll(&self, amount: i32) -> anyhow::Result<()> {
        self.record(InjectedAction::Scroll(amount))
    }

    fn cursor_position(&self) -> Option<(i32, i32)> {
        self.state.lock().ok().and_then(|guard| guard.cursor)
    }
}
