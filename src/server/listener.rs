use libc::{FD_ISSET, FD_SET, FD_ZERO, fd_set, pselect, timespec};
use log::debug;
use std::io;
use std::mem;
use std::net::{SocketAddr, TcpListener};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::time::Duration;

const BACKLOG: libc::c_int = 128;

fn cvt(ret: libc::c_int) -> io::Result<libc::c_int> {
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret)
    }
}

fn raw_address(addr: &SocketAddr) -> (libc::sockaddr_storage, libc::socklen_t) {
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };

    let len = match addr {
        SocketAddr::V4(v4) => {
            let mut sin: libc::sockaddr_in = unsafe { mem::zeroed() };
            sin.sin_family = libc::AF_INET as libc::sa_family_t;
            sin.sin_port = v4.port().to_be();
            sin.sin_addr = libc::in_addr {
                s_addr: u32::from_ne_bytes(v4.ip().octets()),
            };
            unsafe { std::ptr::write(&mut storage as *mut _ as *mut libc::sockaddr_in, sin) };
            mem::size_of::<libc::sockaddr_in>()
        }
        SocketAddr::V6(v6) => {
            let mut sin6: libc::sockaddr_in6 = unsafe { mem::zeroed() };
            sin6.sin6_family = libc::AF_INET6 as libc::sa_family_t;
            sin6.sin6_port = v6.port().to_be();
            sin6.sin6_flowinfo = v6.flowinfo();
            sin6.sin6_addr = libc::in6_addr {
                s6_addr: v6.ip().octets(),
            };
            sin6.sin6_scope_id = v6.scope_id();
            unsafe { std::ptr::write(&mut storage as *mut _ as *mut libc::sockaddr_in6, sin6) };
            mem::size_of::<libc::sockaddr_in6>()
        }
    };

    (storage, len as libc::socklen_t)
}

/// Bind a listening socket with `SO_REUSEADDR` set, so a restarted server
/// can take over an address whose old connections are still in TIME_WAIT.
pub fn bind_reusable(addr: &SocketAddr) -> io::Result<TcpListener> {
    let domain = match addr {
        SocketAddr::V4(_) => libc::AF_INET,
        SocketAddr::V6(_) => libc::AF_INET6,
    };

    let fd = cvt(unsafe { libc::socket(domain, libc::SOCK_STREAM, 0) })?;
    // Closes the descriptor if any of the steps below fail.
    let socket = unsafe { OwnedFd::from_raw_fd(fd) };

    let enable: libc::c_int = 1;
    cvt(unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_REUSEADDR,
            &enable as *const libc::c_int as *const libc::c_void,
            mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    })?;

    let (storage, len) = raw_address(addr);
    cvt(unsafe {
        libc::bind(
            fd,
            &storage as *const libc::sockaddr_storage as *const libc::sockaddr,
            len,
        )
    })?;
    cvt(unsafe { libc::listen(fd, BACKLOG) })?;

    let listener = TcpListener::from(socket);
    listener.set_nonblocking(true)?;
    debug!("Listening socket bound to {} (fd {})", addr, fd);
    Ok(listener)
}

/// Wait up to `timeout` for a pending connection. An interrupted wait
/// reports `false` so the caller can re-check its shutdown flag.
pub fn wait_for_connection(listener: &TcpListener, timeout: Duration) -> io::Result<bool> {
    let listener_fd = listener.as_raw_fd();

    let mut read_set: fd_set = unsafe { mem::zeroed() };
    unsafe { FD_ZERO(&mut read_set) };
    unsafe { FD_SET(listener_fd, &mut read_set) };

    let timeout = timespec {
        tv_sec: timeout.as_secs() as libc::time_t,
        tv_nsec: timeout.subsec_nanos() as libc::c_long,
    };

    let ready_count = unsafe {
        pselect(
            listener_fd + 1,
            &mut read_set,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            &timeout,
            std::ptr::null(),
        )
    };

    if ready_count < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }

    Ok(ready_count > 0 && unsafe { FD_ISSET(listener_fd, &mut read_set) })
}
