//! Network interface helpers

use std::net::Ipv4Addr;

/// First non-loopback IPv4 address of a local interface, if any.
#[cfg(unix)]
pub fn local_ipv4() -> Option<Ipv4Addr> {
    let mut ifaddrs: *mut libc::ifaddrs = std::ptr::null_mut();
    // SAFETY: the out-pointer is valid; the list is freed below.
    if unsafe { libc::getifaddrs(&mut ifaddrs) } != 0 {
        return None;
    }

    let mut found = None;
    let mut cursor = ifaddrs;
    while !cursor.is_null() {
        // SAFETY: cursor walks the linked list returned by getifaddrs.
        let entry = unsafe { &*cursor };
        cursor = entry.ifa_next;

        if entry.ifa_addr.is_null() {
            continue;
        }
        // SAFETY: ifa_addr points at a sockaddr whose family field is
        // always readable.
        let family = unsafe { (*entry.ifa_addr).sa_family };
        if i32::from(family) != libc::AF_INET {
            continue;
        }
        // SAFETY: AF_INET entries hold a sockaddr_in.
        let addr_in = unsafe { &*(entry.ifa_addr as *const libc::sockaddr_in) };
        let ip = Ipv4Addr::from(u32::from_be(addr_in.sin_addr.s_addr));
        if !ip.is_loopback() {
            found = Some(ip);
            break;
        }
    }

    // SAFETY: ifaddrs came from getifaddrs and is freed exactly once.
    unsafe { libc::freeifaddrs(ifaddrs) };
    found
}

/// First non-loopback IPv4 address of a local interface, if any.
#[cfg(not(unix))]
pub fn local_ipv4() -> Option<Ipv4Addr> {
    None
}
