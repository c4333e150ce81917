//! Driver loop.
use crate::{
    clock::{Clock, CycleBudget},
    error::Chip8Result,
    vm::{Chip8Vm, Flow, Hz},
};

/// Drives a VM in frames of 1/60th of a second.
///
/// Each frame executes the cycles the clock speed allows, then counts down
/// the timers once. When throttled, frames are paced to real time.
pub struct Runner {
    vm: Chip8Vm,
    budget: CycleBudget,
    clock: Clock,
    throttle: bool,
}

/// What happened during a frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Cycles executed, including stalled ones.
    pub cycles: usize,
    /// Display buffer changed and should be presented.
    pub draw: bool,
    /// Buzzer state after the timers were updated.
    pub sound: bool,
    /// Frame ended with the machine waiting for a key.
    pub key_wait: bool,
}

impl Runner {
    pub fn new(vm: Chip8Vm) -> Self {
        let budget = CycleBudget::new(vm.config().clock_frequency);

        Self {
            vm,
            budget,
            clock: Clock::timer(),
            throttle: false,
        }
    }

    /// Pace frames to 60 per second.
    pub fn with_throttle(mut self, throttle: bool) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn vm(&self) -> &Chip8Vm {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Chip8Vm {
        &mut self.vm
    }

    pub fn into_inner(self) -> Chip8Vm {
        self.vm
    }

    pub fn clock_frequency(&self) -> Hz {
        self.budget.clock_frequency()
    }

    /// Change the emulated CPU speed, effective from the next frame.
    pub fn set_clock_hz(&mut self, clock_frequency: Hz) {
        log::info!("clock frequency: {clock_frequency}");
        self.budget.set_clock_frequency(clock_frequency);
    }

    /// Run a single frame.
    ///
    /// Execution stops at the first fault, and the timers are not updated
    /// for that frame.
    pub fn frame(&mut self) -> Chip8Result<Frame> {
        if self.throttle {
            self.clock.wait();
        }

        let mut frame = Frame::default();

        for _ in 0..self.budget.next_frame() {
            match self.vm.cycle()? {
                Flow::Halted | Flow::Paused => break,
                Flow::Draw => frame.draw = true,
                _ => {}
            }
            frame.cycles += 1;
        }

        // Timers keep counting while the debugger holds execution.
        self.vm.update_timers();

        frame.draw |= self.vm.take_draw_flag();
        frame.sound = self.vm.sound_active();
        frame.key_wait = matches!(
            self.vm.cpu().key_wait(),
            crate::cpu::KeyWait::WaitingForKey { .. }
        );

        Ok(frame)
    }

    /// Run a number of frames, handing each one to `on_frame` before the next starts.
    pub fn run_frames<F>(&mut self, count: usize, mut on_frame: F) -> Chip8Result<()>
    where
        F: FnMut(usize, &mut Chip8Vm, &Frame),
    {
        for index in 0..count {
            let frame = self.frame()?;
            on_frame(index, &mut self.vm, &frame);
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{error::Chip8Error, vm::Chip8Conf};

    fn runner(rom: &[u8], hz: u64) -> Runner {
        let mut vm = Chip8Vm::new(Chip8Conf {
            clock_frequency: Hz(hz),
            ..Default::default()
        });
        vm.load_rom(rom).unwrap();
        Runner::new(vm)
    }

    #[test]
    fn test_frame_budget() {
        // ADD v0, 1 ; JP 0x200
        let mut runner = runner(&[0x70, 0x01, 0x12, 0x00], 600);
        let frame = runner.frame().unwrap();
        assert_eq!(frame.cycles, 10);
        assert!(frame.draw, "reset must request a redraw");
        assert_eq!(runner.vm().cpu().v(0), 5);

        let frame = runner.frame().unwrap();
        assert!(!frame.draw);
        assert_eq!(runner.vm().cpu().v(0), 10);
    }

    #[test]
    #[rustfmt::skip]
    fn test_timers_count_per_frame() {
        let mut runner = runner(&[
            0x60, 0x03, // LD v0, 3
            0xF0, 0x18, // LD ST, v0
            0x12, 0x04, // JP 0x204
        ], 120);

        let frame = runner.frame().unwrap();
        assert_eq!(frame.cycles, 2);
        assert!(frame.sound);
        assert_eq!(runner.vm().cpu().sound_timer(), 2);

        runner.run_frames(2, |_, _, _| {}).unwrap();
        assert!(!runner.vm().sound_active());
    }

    #[test]
    fn test_key_wait_frame() {
        let mut runner = runner(&[0xF0, 0x0A, 0x12, 0x02], 600);
        let frame = runner.frame().unwrap();
        assert!(frame.key_wait);
        assert_eq!(frame.cycles, 10);

        let mut pressed = false;
        runner
            .run_frames(1, |index, vm, _| {
                assert_eq!(index, 0);
                vm.key_down(9);
                pressed = true;
            })
            .unwrap();
        assert!(pressed);

        let frame = runner.frame().unwrap();
        assert!(!frame.key_wait);
        assert_eq!(runner.vm().cpu().v(0), 9);
    }

    #[test]
    fn test_set_clock_hz() {
        let mut runner = runner(&[0x12, 0x00], 600);
        runner.set_clock_hz(Hz(60));
        assert_eq!(runner.clock_frequency(), Hz(60));
        assert_eq!(runner.frame().unwrap().cycles, 1);
    }

    #[test]
    fn test_fault_stops_frame() {
        let mut runner = runner(&[0x00, 0xEE], 600);
        let err = runner.frame().unwrap_err();
        assert!(matches!(err, Chip8Error::StackUnderflow { .. }));
    }

    #[test]
    #[rustfmt::skip]
    fn test_paused_frame() {
        let mut runner = runner(&[
            0x60, 0x1E, // LD v0, 30
            0xF0, 0x15, // LD DT, v0
            0xF0, 0x18, // LD ST, v0
            0x12, 0x06, // JP 0x206
        ], 600);

        runner.frame().unwrap();
        assert_eq!(runner.vm().cpu().delay_timer(), 29);
        assert_eq!(runner.vm().cpu().sound_timer(), 29);

        runner.vm_mut().set_paused(true);
        let pc = runner.vm().cpu().pc();
        for _ in 0..10 {
            let frame = runner.frame().unwrap();
            assert_eq!(frame.cycles, 0);
        }

        let vm = runner.into_inner();
        assert_eq!(vm.cpu().pc(), pc);
        assert_eq!(vm.cpu().delay_timer(), 19);
        assert_eq!(vm.cpu().sound_timer(), 19);
    }
}
