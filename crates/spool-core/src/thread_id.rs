//! Per-thread worker identity and OS thread accessors
//!
//! Every pool worker records its index and owning pool in thread-local
//! storage for the duration of its life; any code running on that thread
//! can ask "am I inside a pool, and at what index". Threads that are not
//! pool workers observe `None` for both. The OS accessors wrap the
//! platform thread-name, affinity and priority facilities.

use std::cell::Cell;

/// Opaque identity of a pool instance.
///
/// Compared against [`pool_id`] to detect a worker waiting on its own
/// pool. Valid only while the pool is alive; workers clear their copy
/// before the pool is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId(usize);

impl PoolId {
    pub(crate) fn from_addr(addr: usize) -> Self {
        PoolId(addr)
    }
}

thread_local! {
    static WORKER_INDEX: Cell<Option<usize>> = const { Cell::new(None) };
    static OWNING_POOL: Cell<Option<PoolId>> = const { Cell::new(None) };
}

/// Index of the current thread within its owning pool, if any.
pub fn index() -> Option<usize> {
    WORKER_INDEX.with(Cell::get)
}

/// Identity of the pool owning the current thread, if any.
pub fn pool_id() -> Option<PoolId> {
    OWNING_POOL.with(Cell::get)
}

/// Install the identity on worker entry.
pub(crate) fn enter(index: usize, pool: PoolId) {
    WORKER_INDEX.with(|cell| cell.set(Some(index)));
    OWNING_POOL.with(|cell| cell.set(Some(pool)));
}

/// Clear the identity on worker exit so a reused thread never reports a
/// stale pool.
pub(crate) fn exit() {
    WORKER_INDEX.with(|cell| cell.set(None));
    OWNING_POOL.with(|cell| cell.set(None));
}

/// Pre-defined OS thread priority levels.
///
/// The platform choices of scheduling policy, priority and (on Linux)
/// "nice" value are distilled into six portable levels. A priority set by
/// any other means may not correspond to a level, in which case
/// [`os_thread_priority`] returns `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadPriority {
    /// Only runs when the system is otherwise idle.
    Idle,
    /// Below-default priority.
    Low,
    /// The default priority.
    Normal,
    /// Above-default priority.
    AboveNormal,
    /// Round-robin realtime class, mid priority.
    High,
    /// FIFO realtime class, maximum priority.
    Realtime,
}

/// Name of the current OS thread, if the platform exposes one.
#[cfg(unix)]
pub fn os_thread_name() -> Option<String> {
    // macOS caps thread names at 16 bytes including the terminator.
    #[cfg(target_os = "macos")]
    const BUF_LEN: usize = 16;
    #[cfg(not(target_os = "macos"))]
    const BUF_LEN: usize = 64;

    let mut buf = [0 as libc::c_char; BUF_LEN];
    // SAFETY: pthread_self is always valid for the calling thread and the
    // buffer length passed matches the buffer.
    let ret = unsafe { libc::pthread_getname_np(libc::pthread_self(), buf.as_mut_ptr(), BUF_LEN) };
    if ret != 0 {
        return None;
    }
    let bytes: Vec<u8> = buf
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8(bytes).ok()
}

/// Name of the current OS thread, if the platform exposes one.
#[cfg(not(unix))]
pub fn os_thread_name() -> Option<String> {
    None
}

/// Set the name of the current OS thread.
///
/// On Linux the name is truncated by the kernel contract to 15 bytes; a
/// longer name fails with `ERANGE`.
#[cfg(unix)]
pub fn set_os_thread_name(name: &str) -> std::io::Result<()> {
    let cname = std::ffi::CString::new(name)
        .map_err(|_| std::io::Error::from(std::io::ErrorKind::InvalidInput))?;
    // SAFETY: cname is a valid NUL-terminated string outliving the call.
    #[cfg(target_os = "macos")]
    let ret = unsafe { libc::pthread_setname_np(cname.as_ptr()) };
    #[cfg(not(target_os = "macos"))]
    let ret = unsafe { libc::pthread_setname_np(libc::pthread_self(), cname.as_ptr()) };
    if ret == 0 {
        Ok(())
    } else {
        Err(std::io::Error::from_raw_os_error(ret))
    }
}

/// Set the name of the current OS thread.
#[cfg(not(unix))]
pub fn set_os_thread_name(_name: &str) -> std::io::Result<()> {
    Err(std::io::Error::from(std::io::ErrorKind::Unsupported))
}

/// CPU affinity of the current thread as one flag per logical CPU.
#[cfg(target_os = "linux")]
pub fn os_thread_affinity() -> Option<Vec<bool>> {
    // SAFETY: an all-zero cpu_set_t is a valid empty set.
    let mut set: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    // SAFETY: pid 0 addresses the calling thread; the set size matches.
    let ret = unsafe { libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set) };
    if ret != 0 {
        return None;
    }
    let cpus = num_cpus::get();
    let mut affinity = Vec::with_capacity(cpus);
    for cpu in 0..cpus {
        // SAFETY: cpu is within the fixed capacity of cpu_set_t.
        affinity.push(unsafe { libc::CPU_ISSET(cpu, &set) });
    }
    Some(affinity)
}

/// CPU affinity of the current thread as one flag per logical CPU.
#[cfg(not(target_os = "linux"))]
pub fn os_thread_affinity() -> Option<Vec<bool>> {
    None
}

/// Pin the current thread to the CPUs whose flag is set.
#[cfg(target_os = "linux")]
pub fn set_os_thread_affinity(affinity: &[bool]) -> std::io::Result<()> {
    // SAFETY: an all-zero cpu_set_t is a valid empty set.
    let mut set: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    for (cpu, &enabled) in affinity.iter().enumerate() {
        if enabled {
            // SAFETY: cpu is bounded by the caller's slice; CPU_SET is a
            // no-op beyond the set capacity.
            unsafe { libc::CPU_SET(cpu, &mut set) };
        }
    }
    // SAFETY: pid 0 addresses the calling thread; the set size matches.
    let ret = unsafe { libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) };
    if ret == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

/// Pin the current thread to the CPUs whose flag is set.
#[cfg(not(target_os = "linux"))]
pub fn set_os_thread_affinity(_affinity: &[bool]) -> std::io::Result<()> {
    Err(std::io::Error::from(std::io::ErrorKind::Unsupported))
}

#[cfg(target_os = "linux")]
mod priority_impl {
    use super::ThreadPriority;

    fn current_tid() -> libc::id_t {
        // SAFETY: gettid has no preconditions.
        (unsafe { libc::syscall(libc::SYS_gettid) }) as libc::id_t
    }

    fn sched_range(policy: libc::c_int) -> (libc::c_int, libc::c_int) {
        // SAFETY: the policy constants passed are valid.
        unsafe {
            (
                libc::sched_get_priority_min(policy),
                libc::sched_get_priority_max(policy),
            )
        }
    }

    // Nice values for the SCHED_OTHER levels. The usual range is -20..=19,
    // higher values meaning lower priority.
    const NICE_ABOVE_NORMAL: libc::c_int = -18;
    const NICE_NORMAL: libc::c_int = 0;
    const NICE_LOW: libc::c_int = 17;

    pub fn get() -> Option<ThreadPriority> {
        let mut policy: libc::c_int = 0;
        let mut param: libc::sched_param = unsafe { std::mem::zeroed() };
        // SAFETY: pthread_self is valid and both out-pointers are live.
        let ret =
            unsafe { libc::pthread_getschedparam(libc::pthread_self(), &mut policy, &mut param) };
        if ret != 0 {
            return None;
        }
        let (_, fifo_max) = sched_range(libc::SCHED_FIFO);
        if policy == libc::SCHED_FIFO && param.sched_priority == fifo_max {
            return Some(ThreadPriority::Realtime);
        }
        let (rr_min, rr_max) = sched_range(libc::SCHED_RR);
        if policy == libc::SCHED_RR && param.sched_priority == rr_min + (rr_max - rr_min) / 2 {
            return Some(ThreadPriority::High);
        }
        if policy == libc::SCHED_IDLE {
            return Some(ThreadPriority::Idle);
        }
        if policy == libc::SCHED_OTHER {
            // SAFETY: the tid addresses the calling thread.
            let nice = unsafe { libc::getpriority(libc::PRIO_PROCESS as _, current_tid()) };
            return match nice {
                NICE_ABOVE_NORMAL => Some(ThreadPriority::AboveNormal),
                NICE_NORMAL => Some(ThreadPriority::Normal),
                NICE_LOW => Some(ThreadPriority::Low),
                _ => None,
            };
        }
        None
    }

    pub fn set(priority: ThreadPriority) -> std::io::Result<()> {
        let mut policy: libc::c_int = libc::SCHED_OTHER;
        let mut param: libc::sched_param = unsafe { std::mem::zeroed() };
        let mut nice: Option<libc::c_int> = None;
        match priority {
            ThreadPriority::Realtime => {
                policy = libc::SCHED_FIFO;
                param.sched_priority = sched_range(libc::SCHED_FIFO).1;
            }
            ThreadPriority::High => {
                policy = libc::SCHED_RR;
                let (min, max) = sched_range(libc::SCHED_RR);
                param.sched_priority = min + (max - min) / 2;
            }
            ThreadPriority::AboveNormal => nice = Some(NICE_ABOVE_NORMAL),
            ThreadPriority::Normal => nice = Some(NICE_NORMAL),
            ThreadPriority::Low => nice = Some(NICE_LOW),
            ThreadPriority::Idle => policy = libc::SCHED_IDLE,
        }
        // SAFETY: pthread_self is valid and param is initialized.
        let ret = unsafe { libc::pthread_setschedparam(libc::pthread_self(), policy, &param) };
        if ret != 0 {
            return Err(std::io::Error::from_raw_os_error(ret));
        }
        if let Some(nice) = nice {
            // SAFETY: the tid addresses the calling thread.
            let ret = unsafe { libc::setpriority(libc::PRIO_PROCESS as _, current_tid(), nice) };
            if ret != 0 {
                return Err(std::io::Error::last_os_error());
            }
        }
        Ok(())
    }
}

/// Priority level of the current thread, if it matches a pre-defined one.
#[cfg(target_os = "linux")]
pub fn os_thread_priority() -> Option<ThreadPriority> {
    priority_impl::get()
}

/// Priority level of the current thread, if it matches a pre-defined one.
#[cfg(not(target_os = "linux"))]
pub fn os_thread_priority() -> Option<ThreadPriority> {
    None
}

/// Set the priority of the current thread to a pre-defined level.
///
/// Elevating into the realtime classes typically requires privileges.
#[cfg(target_os = "linux")]
pub fn set_os_thread_priority(priority: ThreadPriority) -> std::io::Result<()> {
    priority_impl::set(priority)
}

/// Set the priority of the current thread to a pre-defined level.
#[cfg(not(target_os = "linux"))]
pub fn set_os_thread_priority(_priority: ThreadPriority) -> std::io::Result<()> {
    Err(std::io::Error::from(std::io::ErrorKind::Unsupported))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_non_worker_has_no_identity() {
        assert_eq!(index(), None);
        assert_eq!(pool_id(), None);
    }

    #[test]
    fn test_enter_exit_roundtrip() {
        thread::spawn(|| {
            let id = PoolId::from_addr(0xdead_beef);
            enter(3, id);
            assert_eq!(index(), Some(3));
            assert_eq!(pool_id(), Some(id));
            exit();
            assert_eq!(index(), None);
            assert_eq!(pool_id(), None);
        })
        .join()
        .unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_os_thread_name_roundtrip() {
        thread::spawn(|| {
            set_os_thread_name("spool-t0").unwrap();
            assert_eq!(os_thread_name().as_deref(), Some("spool-t0"));
        })
        .join()
        .unwrap();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_affinity_reports_a_cpu() {
        let affinity = os_thread_affinity().unwrap();
        assert!(affinity.iter().any(|&on| on));
    }
}
