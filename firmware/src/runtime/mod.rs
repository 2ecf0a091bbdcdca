use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Flex, Pull};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::board::BoardOutputs;
use crate::policy::{ACTIVE_CONFIG, ACTIVE_KIND, SUPERVISOR};
use crate::telemetry::{TelemetryEvent, TelemetryRecorder};

mod sampler_task;
mod service_task;
mod tick_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        cortex_m::interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                cortex_m::interrupt::enable();
            }
        }
    }
}

/// Depth of the interrupt-to-loop event queue.
pub const EVENT_QUEUE_DEPTH: usize = 8;

pub type EventQueue = Channel<CriticalSectionRawMutex, TelemetryEvent, EVENT_QUEUE_DEPTH>;

/// Events produced by the edge and tick tasks, drained by the service loop.
pub(super) static EVENTS: EventQueue = Channel::new();

/// Runs edge capture and the tick above the thread-mode service loop.
static EDGE_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn TIM14() {
    unsafe { EDGE_EXECUTOR.on_interrupt() }
}

/// Queues an event without blocking. A full queue drops the event; request
/// flags live in the supervisor, so the loop still services them.
pub(super) fn publish(event: TelemetryEvent) {
    if EVENTS.try_send(event).is_err() {
        defmt::trace!("telemetry queue full, dropped {}", event.kind.label());
    }
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA4,
        PA5,
        EXTI0,
        EXTI1,
        ..
    } = hal::init(config);

    // Outputs reach their idle drive before any input is watched.
    let outputs = BoardOutputs::new(Flex::new(PA4), Flex::new(PA5));

    defmt::info!(
        "supervisor: policy={} tick={}us cold-start={} steady={} ticks",
        ACTIVE_KIND.label(),
        ACTIVE_CONFIG.tick.as_micros(),
        SUPERVISOR.monitor().cold_start_threshold(),
        SUPERVISOR.monitor().steady_threshold()
    );

    interrupt::TIM14.set_priority(Priority::P1);
    let edge_spawner = EDGE_EXECUTOR.start(interrupt::TIM14);

    edge_spawner
        .spawn(sampler_task::heartbeat(ExtiInput::new(PA0, EXTI0, Pull::None)))
        .expect("failed to spawn heartbeat sampler");
    edge_spawner
        .spawn(sampler_task::trigger(ExtiInput::new(PA1, EXTI1, Pull::None)))
        .expect("failed to spawn trigger sampler");
    edge_spawner
        .spawn(tick_task::run())
        .expect("failed to spawn tick task");

    spawner
        .spawn(service_task::run(outputs, TelemetryRecorder::new()))
        .expect("failed to spawn service loop");

    core::future::pending::<()>().await;
}
