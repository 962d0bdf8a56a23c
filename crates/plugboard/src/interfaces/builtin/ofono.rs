//! Telephony service (`ofono`).
//!
//! The slot side is the modem daemon: it owns `org.ofono` on the system bus,
//! drives modem device nodes and creates ppp interfaces. Connected plugs may
//! talk to it over D-Bus. On classic hosts the daemon usually comes from the
//! distribution and runs unconfined, so plugs are also allowed to reach it
//! there.

use bytes::Bytes;
use plugboard_common::PlugboardResult;

use crate::interfaces::{
    Fragment, Interface, LabelExpr, PeerTemplate, Plug, Slot, plug_label_expr, slot_label_expr,
};
use crate::security::{BusNameOwnership, SecurityBackend};

const BUS_NAME: &str = "org.ofono";

/// Agent interfaces the daemon calls back into as root.
const AGENT_INTERFACES: &[&str] = &[
    "org.ofono.SimToolkitAgent",
    "org.ofono.PushNotificationAgent",
    "org.ofono.SmartMessagingAgent",
    "org.ofono.PositioningRequestAgent",
    "org.ofono.HandsfreeAudioAgent",
];

const PERMANENT_SLOT_APPARMOR: &str = r#"
# Operating as the ofono service. Privileged: grants access to modems and
# network configuration.

# ppp network interfaces
capability net_admin,

# Device discovery
/run/udev/data/+usb:* r,
/run/udev/data/+usb-serial:* r,
/run/udev/data/+pci:* r,
/run/udev/data/+platform:* r,
/run/udev/data/+pnp:* r,
/run/udev/data/c* r,
/run/udev/data/n* r,
/sys/bus/usb/devices/ r,
/sys/bus/usb/devices/** r,

# Current seat, for per-user preferences such as the default SIM
/run/systemd/seats/{,*} r,

# Modem ports
/dev/tty[^0-9]* rw,
/dev/cdc-* rw,
/dev/modem* rw,
/dev/dsp rw,
/dev/chnlat11 rw,
/dev/socket/rild* rw,
# ppp runs on top of tun
/dev/net/tun rw,

network netlink raw,
network netlink dgram,
network bridge,
network inet,
network inet6,
network packet,
network bluetooth,

include <abstractions/nameservice>
include <abstractions/dbus-strict>

dbus (send)
    bus=system
    path=/org/freedesktop/DBus
    interface=org.freedesktop.DBus
    member={Request,Release}Name
    peer=(name=org.freedesktop.DBus, label=unconfined),

dbus (bind)
    bus=system
    name="org.ofono",

# Unconfined clients may talk to the service
dbus (receive, send)
    bus=system
    path=/{,**}
    interface=org.ofono.*
    peer=(label=unconfined),
"#;

const CONNECTED_SLOT_APPARMOR: PeerTemplate = PeerTemplate::new(
    r"
# Traffic with a connected client. Object paths depend on the modem plugin.
dbus (receive, send)
    bus=system
    path=/{,**}
    interface=org.ofono.*
    peer=(label=",
    "),\n",
);

const CONNECTED_PLUG_APPARMOR: PeerTemplate = PeerTemplate::new(
    r"
# Using the ofono service. Privileged: grants control of the modems.
#include <abstractions/dbus-strict>

dbus (receive, send)
    bus=system
    path=/{,**}
    interface=org.ofono.*
    peer=(label=",
    "),\n",
);

const CLASSIC_PLUG_APPARMOR: PeerTemplate = PeerTemplate::new(
    r"
# The ofono service of a classic host runs unconfined.
dbus (receive, send)
    bus=system
    path=/{,**}
    interface=org.ofono.*
    peer=(label=",
    "),\n",
);

const PERMANENT_SLOT_SECCOMP: &str = r"
# Operating as the ofono service: D-Bus, netlink and rild sockets
accept
accept4
bind
getsockopt
listen
recv
recvfrom
recvmmsg
recvmsg
send
sendmmsg
sendmsg
sendto
shutdown
";

const CONNECTED_PLUG_SECCOMP: &str = r"
# Talking to the ofono service over the system bus
recv
recvmsg
recvfrom
send
sendto
sendmsg
";

const PERMANENT_SLOT_UDEV: &str = r#"
# Modems that ofono identifies through udev properties rather than probing.

ACTION!="add|change", GOTO="ofono_end"

# ISI/Phonet drivers
SUBSYSTEM!="net", GOTO="ofono_isi_end"
ATTRS{type}!="820", GOTO="ofono_isi_end"
KERNELS=="gadget", GOTO="ofono_isi_end"

# Nokia N900 modem
SUBSYSTEMS=="hsi", ENV{OFONO_DRIVER}="n900", ENV{OFONO_ISI_ADDRESS}="108"
KERNEL=="phonet*", ENV{OFONO_DRIVER}="n900", ENV{OFONO_ISI_ADDRESS}="108"

# STE u8500
KERNEL=="shrm0", ENV{OFONO_DRIVER}="u8500"

LABEL="ofono_isi_end"

SUBSYSTEM!="usb", GOTO="ofono_end"
ENV{DEVTYPE}!="usb_device", GOTO="ofono_end"

# Fake serial number
ATTRS{serial}=="1234567890ABCDEF", ENV{ID_SERIAL_SHORT}=""

# Nokia CDMA
ATTRS{idVendor}=="0421", ATTRS{idProduct}=="023e", ENV{OFONO_DRIVER}="nokiacdma"
ATTRS{idVendor}=="0421", ATTRS{idProduct}=="00b6", ENV{OFONO_DRIVER}="nokiacdma"

# Lenovo H5321gw
ATTRS{idVendor}=="0bdb", ATTRS{idProduct}=="1926", ENV{OFONO_DRIVER}="mbm"

LABEL="ofono_end"

ACTION!="add|change", GOTO="ofono_speedup_end"

SUBSYSTEM!="tty", GOTO="ofono_speedup_end"
KERNEL!="ttyUSB[0-9]*", GOTO="ofono_speedup_end"

# SpeedUp 7300
ATTRS{idVendor}=="1c9e", ATTRS{idProduct}=="9e00", ENV{ID_USB_INTERFACE_NUM}=="00", ENV{OFONO_LABEL}="modem"
ATTRS{idVendor}=="1c9e", ATTRS{idProduct}=="9e00", ENV{ID_USB_INTERFACE_NUM}=="03", ENV{OFONO_LABEL}="aux"

# SpeedUp
ATTRS{idVendor}=="2020", ATTRS{idProduct}=="1005", ENV{ID_USB_INTERFACE_NUM}=="03", ENV{OFONO_LABEL}="modem"
ATTRS{idVendor}=="2020", ATTRS{idProduct}=="1005", ENV{ID_USB_INTERFACE_NUM}=="01", ENV{OFONO_LABEL}="aux"
ATTRS{idVendor}=="2020", ATTRS{idProduct}=="1008", ENV{ID_USB_INTERFACE_NUM}=="03", ENV{OFONO_LABEL}="modem"
ATTRS{idVendor}=="2020", ATTRS{idProduct}=="1008", ENV{ID_USB_INTERFACE_NUM}=="01", ENV{OFONO_LABEL}="aux"

# SpeedUp 9800
ATTRS{idVendor}=="1c9e", ATTRS{idProduct}=="9800", ENV{ID_USB_INTERFACE_NUM}=="01", ENV{OFONO_LABEL}="modem"
ATTRS{idVendor}=="1c9e", ATTRS{idProduct}=="9800", ENV{ID_USB_INTERFACE_NUM}=="02", ENV{OFONO_LABEL}="aux"

# SpeedUp U3501
ATTRS{idVendor}=="1c9e", ATTRS{idProduct}=="9605", ENV{ID_USB_INTERFACE_NUM}=="03", ENV{OFONO_LABEL}="modem"
ATTRS{idVendor}=="1c9e", ATTRS{idProduct}=="9605", ENV{ID_USB_INTERFACE_NUM}=="01", ENV{OFONO_LABEL}="aux"

LABEL="ofono_speedup_end"
"#;

/// Access to the ofono telephony service.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfonoInterface;

impl Interface for OfonoInterface {
    fn name(&self) -> &'static str {
        "ofono"
    }

    fn permanent_slot_fragment(
        &self,
        _slot: &Slot,
        backend: SecurityBackend,
    ) -> PlugboardResult<Option<Fragment>> {
        Ok(match backend {
            SecurityBackend::AppArmor => {
                Some(Bytes::from_static(PERMANENT_SLOT_APPARMOR.as_bytes()))
            }
            SecurityBackend::SecComp => {
                Some(Bytes::from_static(PERMANENT_SLOT_SECCOMP.as_bytes()))
            }
            SecurityBackend::UDev => Some(Bytes::from_static(PERMANENT_SLOT_UDEV.as_bytes())),
            // Bus ownership is declared through `bus_name_ownership`.
            SecurityBackend::DBus => None,
        })
    }

    fn connected_slot_fragment(
        &self,
        plug: &Plug,
        _slot: &Slot,
        backend: SecurityBackend,
    ) -> PlugboardResult<Option<Fragment>> {
        Ok(match backend {
            SecurityBackend::AppArmor => {
                Some(CONNECTED_SLOT_APPARMOR.render(&plug_label_expr(plug)))
            }
            _ => None,
        })
    }

    fn connected_plug_fragment(
        &self,
        _plug: &Plug,
        slot: &Slot,
        backend: SecurityBackend,
    ) -> PlugboardResult<Option<Fragment>> {
        Ok(match backend {
            SecurityBackend::AppArmor => {
                Some(CONNECTED_PLUG_APPARMOR.render(&slot_label_expr(slot)))
            }
            SecurityBackend::SecComp => {
                Some(Bytes::from_static(CONNECTED_PLUG_SECCOMP.as_bytes()))
            }
            _ => None,
        })
    }

    fn classic_plug_fragment(
        &self,
        _plug: &Plug,
        _slot: &Slot,
        backend: SecurityBackend,
    ) -> Option<Fragment> {
        match backend {
            SecurityBackend::AppArmor => {
                Some(CLASSIC_PLUG_APPARMOR.render(&LabelExpr::unconfined()))
            }
            _ => None,
        }
    }

    fn bus_name_ownership(&self, _slot: &Slot) -> Option<BusNameOwnership> {
        Some(
            BusNameOwnership::root(BUS_NAME)
                .with_send_interfaces(AGENT_INTERFACES.iter().copied()),
        )
    }
}
