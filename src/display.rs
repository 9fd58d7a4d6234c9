use crate::error::HandCursorError;
use serde::{Deserialize, Serialize};

/// Pixel rectangle of one monitor in virtual desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl MonitorRect {
    pub fn contains(&self, point: (i32, i32)) -> bool {
        point.0 >= self.x
            && point.0 < self.x + self.width
            && point.1 >= self.y
            && point.1 < self.y + self.height
    }
}

pub trait DisplayGeometry {
    fn monitors(&self) -> Vec<MonitorRect>;
}

/// A fixed monitor layout, typically taken from the settings file.
#[derive(Debug, Clone, Default)]
pub struct StaticDisplays {
    monitors: Vec<MonitorRect>,
}

impl StaticDisplays {
    pub fn new(monitors: Vec<MonitorRect>) -> Self {
        Self { monitors }
    }
}

impl DisplayGeometry for StaticDisplays {
    fn monitors(&self) -> Vec<MonitorRect> {
        self.monitors.clone()
    }
}

/// Monitors reported by the operating system.
#[derive(Debug, Default)]
pub struct OsDisplays;

impl DisplayGeometry for OsDisplays {
    fn monitors(&self) -> Vec<MonitorRect> {
        enumerate_monitors()
    }
}

/// Resolve the configured monitor index. An unknown index is fatal at startup.
pub fn resolve_monitor(
    geometry: &dyn DisplayGeometry,
    index: usize,
) -> Result<MonitorRect, HandCursorError> {
    let monitors = geometry.monitors();
    monitors
        .get(index)
        .copied()
        .ok_or(HandCursorError::MonitorUnavailable {
            index,
            available: monitors.len(),
        })
}

#[cfg(windows)]
fn enumerate_monitors() -> Vec<MonitorRect> {
    use std::mem;
    use windows::Win32::Foundation::{BOOL, LPARAM, RECT};
    use windows::Win32::Graphics::Gdi::{
        EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFOEXW,
    };

    extern "system" fn monitor_enum_proc(
        monitor: HMONITOR,
        _hdc: HDC,
        _rc_clip: *mut RECT,
        data: LPARAM,
    ) -> BOOL {
        let monitors = unsafe { &mut *(data.0 as *mut Vec<MonitorRect>) };
        let mut info = MONITORINFOEXW::default();
        info.monitorInfo.cbSize = mem::size_of::<MONITORINFOEXW>() as u32;
        if unsafe { GetMonitorInfoW(monitor, &mut info.monitorInfo as *mut _ as *mut _) }.as_bool()
        {
            let rc = info.monitorInfo.rcMonitor;
            monitors.push(MonitorRect {
                x: rc.left,
                y: rc.top,
                width: rc.right - rc.left,
                height: rc.bottom - rc.top,
            });
        }
        BOOL(1)
    }

    let mut monitors = Vec::new();
    unsafe {
        let _ = EnumDisplayMonitors(
            HDC::default(),
            None,
            Some(monitor_enum_proc),
            LPARAM(&mut monitors as *mut Vec<MonitorRect> as isize),
        );
    }
    monitors
}

#[cfg(not(windows))]
fn enumerate_monitors() -> Vec<MonitorRect> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> StaticDisplays {
        StaticDisplays::new(vec![
            MonitorRect {
                x: -1920,
                y: 0,
                width: 1920,
                height: 1080,
            },
            MonitorRect {
                x: 0,
                y: 0,
                width: 2560,
                height: 1440,
            },
        ])
    }

    #[test]
    fn resolves_configured_index() {
        let rect = resolve_monitor(&layout(), 1).unwrap();
        assert_eq!(rect.width, 2560);
        assert!(rect.contains((2559, 1439)));
        assert!(!rect.contains((2560, 10)));
    }

    #[test]
    fn unknown_index_is_an_error() {
        let err = resolve_monitor(&layout(), 2).unwrap_err();
        assert_eq!(
            err,
            HandCursorError::MonitorUnavailable {
                index: 2,
                available: 2
            }
        );
    }
}
