//! BLE GATT server adapter.
//!
//! Implements [`GattPort`], the boundary between the device service and
//! the Bluetooth stack, and brings the peripheral up:
//! services, characteristics and CCCDs from [`crate::gatt`], then
//! advertising.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: raw Bluedroid GATTS/GAP API via `esp_idf_svc::sys`.
//! - **all other targets**: in-memory simulation for host-side tests.
//!
//! ## Registration sequence
//!
//! Bluedroid registers attributes asynchronously; each completion event
//! triggers the next step.
//!
//! ```text
//!   REG ─▶ create svc[0] ─▶ CREATE ─▶ add char ─▶ ADD_CHAR ─┬─▶ add CCCD ─▶ ADD_CHAR_DESCR ─┐
//!                                        ▲                 └────────────────────────────────┤
//!                                        └──────────── next char / next service ◀───────────┘
//!   last char done ─▶ adv data + scan response ─▶ both set ─▶ start advertising
//! ```
//!
//! Client writes are copied into [`Event::CharacteristicWritten`] and
//! pushed onto the inbound queue; nothing here touches controller state.
//! Prepared (long or reliable) writes are assembled and queued the same
//! way once the client executes them.

use log::info;

use crate::app::ports::GattPort;
use crate::error::CommsError;
use crate::gatt::{CharValue, Characteristic, Service};

#[cfg(not(target_os = "espidf"))]
use crate::events::{GattWrite, PreparedWrites};

// ───────────────────────────────────────────────────────────────
// ESP-IDF static state
// ───────────────────────────────────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures.  These statics bridge the Bluedroid task to the adapter.

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU32, Ordering as AtomicOrdering};

#[cfg(target_os = "espidf")]
use crate::events::{push_event, Event, GattWrite, PreparedWrites};
#[cfg(target_os = "espidf")]
use crate::gatt::{Uuid, DESCRIPTOR_CCCD, MAX_VALUE_LEN, SERVICE_BLINKER};

#[cfg(target_os = "espidf")]
static BLE_GATTS_IF: AtomicU8 = AtomicU8::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONN_ID: AtomicU16 = AtomicU16::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONNECTED: AtomicBool = AtomicBool::new(false);
/// Index into [`Service::ALL`] being registered.
#[cfg(target_os = "espidf")]
static BLE_SERVICE_STEP: AtomicU32 = AtomicU32::new(0);
/// Index into the current service's characteristics.
#[cfg(target_os = "espidf")]
static BLE_CHAR_STEP: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU16 = AtomicU16::new(0);
/// Bit 0: advertising data pending; bit 1: scan response pending.
#[cfg(target_os = "espidf")]
static BLE_ADV_PENDING: AtomicU8 = AtomicU8::new(0);
#[cfg(target_os = "espidf")]
const ADV_DATA_PENDING: u8 = 0b01;
#[cfg(target_os = "espidf")]
const SCAN_RSP_PENDING: u8 = 0b10;

/// Attribute handle per characteristic, 0 until registered.
#[cfg(target_os = "espidf")]
static BLE_HANDLES: [AtomicU16; Characteristic::COUNT] =
    [const { AtomicU16::new(0) }; Characteristic::COUNT];

/// Mirror of every characteristic value.  Written by `publish` on the main
/// task and by client writes on the Bluedroid task; the lock also orders
/// handle registration against publishes.
#[cfg(target_os = "espidf")]
static BLE_VALUES: std::sync::Mutex<[CharValue; Characteristic::COUNT]> =
    std::sync::Mutex::new([const { heapless::Vec::new() }; Characteristic::COUNT]);

/// Prepared-write fragments, Bluedroid task only.
#[cfg(target_os = "espidf")]
static BLE_PREPARED: std::sync::Mutex<PreparedWrites> =
    std::sync::Mutex::new(PreparedWrites::new());

/// Scan response payload: the blinker service, 128-bit, little-endian.
#[cfg(target_os = "espidf")]
static ADV_SERVICE_UUID: [u8; 16] = SERVICE_BLINKER.to_le_bytes();

#[cfg(target_os = "espidf")]
fn esp_uuid(uuid: Uuid) -> esp_idf_svc::sys::esp_bt_uuid_t {
    // SAFETY: esp_bt_uuid_t is a plain C struct; all-zero is valid.
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    match uuid {
        Uuid::Short(u) => {
            t.len = 2;
            t.uuid.uuid16 = u;
        }
        Uuid::Long(u) => {
            t.len = 16;
            t.uuid.uuid128 = u.to_le_bytes();
        }
    }
    t
}

#[cfg(target_os = "espidf")]
fn adv_params() -> esp_idf_svc::sys::esp_ble_adv_params_t {
    use esp_idf_svc::sys::*;
    esp_ble_adv_params_t {
        adv_int_min: 0x20,
        adv_int_max: 0x40,
        adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
        own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
        channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
        adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
        // SAFETY: remaining fields are plain integers / addresses.
        ..unsafe { core::mem::zeroed() }
    }
}

/// Copy the mirrored value of `ch` into its attribute.
#[cfg(target_os = "espidf")]
fn sync_attr(ch: Characteristic, handle: u16) {
    let Ok(value) = BLE_VALUES.lock().map(|values| values[ch.index()].clone()) else {
        return;
    };
    // The lock is released before posting to the BTC task.
    // SAFETY: handle was issued by the stack; value is copied.
    unsafe {
        esp_idf_svc::sys::esp_ble_gatts_set_attr_value(handle, value.len() as u16, value.as_ptr());
    }
}

/// Record a client write in the mirror and queue it for the main loop.
#[cfg(target_os = "espidf")]
fn commit_client_write(write: GattWrite) {
    if let Ok(mut values) = BLE_VALUES.lock() {
        values[write.characteristic.index()] =
            CharValue::from_slice(&write.data).unwrap_or_default();
    }
    push_event(Event::CharacteristicWritten(write));
}

#[cfg(target_os = "espidf")]
fn characteristic_for_handle(handle: u16) -> Option<Characteristic> {
    if handle == 0 {
        return None;
    }
    Characteristic::ALL
        .into_iter()
        .find(|ch| BLE_HANDLES[ch.index()].load(AtomicOrdering::Acquire) == handle)
}

// ── Registration steps ────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn create_service(gatts_if: u8, svc: Service) {
    use esp_idf_svc::sys::*;
    let mut svc_id = esp_gatt_srvc_id_t {
        id: esp_gatt_id_t {
            uuid: esp_uuid(svc.uuid()),
            inst_id: 0,
        },
        is_primary: true,
    };
    // SAFETY: svc_id is copied by the stack before the call returns.
    unsafe { esp_ble_gatts_create_service(gatts_if, &mut svc_id, svc.handle_count()) };
}

#[cfg(target_os = "espidf")]
unsafe fn add_char(svc_handle: u16, ch: Characteristic) {
    use esp_idf_svc::sys::*;
    let access = ch.access();
    let mut perm = 0u32;
    let mut prop = 0u32;
    if access.readable() {
        perm |= ESP_GATT_PERM_READ;
        prop |= ESP_GATT_CHAR_PROP_BIT_READ;
    }
    if access.writable() {
        perm |= ESP_GATT_PERM_WRITE;
        prop |= ESP_GATT_CHAR_PROP_BIT_WRITE;
    }
    if access.notifies() {
        prop |= ESP_GATT_CHAR_PROP_BIT_NOTIFY;
    }

    let initial: CharValue = BLE_VALUES
        .lock()
        .map(|values| values[ch.index()].clone())
        .unwrap_or_default();
    let mut char_uuid = esp_uuid(ch.uuid());
    let mut value = esp_attr_value_t {
        attr_max_len: MAX_VALUE_LEN as u16,
        attr_len: initial.len() as u16,
        attr_value: initial.as_ptr().cast_mut(),
    };
    let mut control = esp_attr_control_t {
        auto_rsp: ESP_GATT_AUTO_RSP as u8,
    };
    // SAFETY: the stack deep-copies uuid, value and control.
    unsafe {
        esp_ble_gatts_add_char(
            svc_handle,
            &mut char_uuid,
            perm as esp_gatt_perm_t,
            prop as esp_gatt_char_prop_t,
            &mut value,
            &mut control,
        );
    }
}

#[cfg(target_os = "espidf")]
unsafe fn add_cccd(svc_handle: u16) {
    use esp_idf_svc::sys::*;
    let mut initial = [0u8; 2];
    let mut descr_uuid = esp_uuid(Uuid::Short(DESCRIPTOR_CCCD));
    let mut value = esp_attr_value_t {
        attr_max_len: 2,
        attr_len: 2,
        attr_value: initial.as_mut_ptr(),
    };
    let mut control = esp_attr_control_t {
        auto_rsp: ESP_GATT_AUTO_RSP as u8,
    };
    // SAFETY: the stack deep-copies uuid, value and control.
    unsafe {
        esp_ble_gatts_add_char_descr(
            svc_handle,
            &mut descr_uuid,
            (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
            &mut value,
            &mut control,
        );
    }
}

/// Move to the next characteristic, the next service, or advertising.
#[cfg(target_os = "espidf")]
unsafe fn register_next(gatts_if: u8) {
    let svc_index = BLE_SERVICE_STEP.load(AtomicOrdering::Relaxed) as usize;
    let char_index = BLE_CHAR_STEP.load(AtomicOrdering::Relaxed) as usize + 1;
    let Some(&svc) = Service::ALL.get(svc_index) else {
        return;
    };

    if let Some(&ch) = svc.characteristics().get(char_index) {
        BLE_CHAR_STEP.store(char_index as u32, AtomicOrdering::Relaxed);
        unsafe { add_char(BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed), ch) };
        return;
    }

    let next_svc = svc_index + 1;
    BLE_SERVICE_STEP.store(next_svc as u32, AtomicOrdering::Relaxed);
    BLE_CHAR_STEP.store(0, AtomicOrdering::Relaxed);
    match Service::ALL.get(next_svc) {
        Some(&svc) => unsafe { create_service(gatts_if, svc) },
        None => {
            info!("BLE GATTS: all attributes registered");
            unsafe { configure_advertising() };
        }
    }
}

#[cfg(target_os = "espidf")]
unsafe fn configure_advertising() {
    use esp_idf_svc::sys::*;
    BLE_ADV_PENDING.store(ADV_DATA_PENDING | SCAN_RSP_PENDING, AtomicOrdering::Release);

    let flag = (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8;
    let mut adv_data = esp_ble_adv_data_t {
        set_scan_rsp: false,
        include_name: true,
        include_txpower: false,
        flag,
        // SAFETY: remaining fields are lengths and null pointers.
        ..unsafe { core::mem::zeroed() }
    };
    let mut scan_rsp = esp_ble_adv_data_t {
        set_scan_rsp: true,
        include_name: false,
        include_txpower: false,
        service_uuid_len: ADV_SERVICE_UUID.len() as u16,
        p_service_uuid: ADV_SERVICE_UUID.as_ptr().cast_mut(),
        flag,
        // SAFETY: as above.
        ..unsafe { core::mem::zeroed() }
    };
    // SAFETY: the stack copies both payloads; the UUID buffer is static
    // and only read.
    unsafe {
        esp_ble_gap_config_adv_data(&mut adv_data);
        esp_ble_gap_config_adv_data(&mut scan_rsp);
    }
}

#[cfg(target_os = "espidf")]
fn adv_step_complete(bit: u8) {
    let before = BLE_ADV_PENDING.fetch_and(!bit, AtomicOrdering::AcqRel);
    if before != 0 && before & !bit == 0 {
        let mut params = adv_params();
        // SAFETY: params is copied by the stack.
        unsafe { esp_idf_svc::sys::esp_ble_gap_start_advertising(&mut params) };
    }
}

// ── Callbacks ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    _param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_SET_COMPLETE_EVT => {
            adv_step_complete(ADV_DATA_PENDING);
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_SCAN_RSP_DATA_SET_COMPLETE_EVT => {
            adv_step_complete(SCAN_RSP_PENDING);
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising started");
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising stopped");
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use esp_idf_svc::sys::*;

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            BLE_GATTS_IF.store(gatts_if, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: app registered (if={})", gatts_if);
            BLE_SERVICE_STEP.store(0, AtomicOrdering::Relaxed);
            BLE_CHAR_STEP.store(0, AtomicOrdering::Relaxed);
            unsafe { create_service(gatts_if, Service::ALL[0]) };
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
            // SAFETY: `create` is the active union member for this event.
            let p = unsafe { &(*param).create };
            let svc_handle = p.service_handle;
            BLE_SVC_HANDLE.store(svc_handle, AtomicOrdering::Relaxed);
            let svc_index = BLE_SERVICE_STEP.load(AtomicOrdering::Relaxed) as usize;
            log::info!(
                "BLE GATTS: service {} created (handle={})",
                svc_index,
                svc_handle
            );
            unsafe { esp_ble_gatts_start_service(svc_handle) };
            if let Some(&ch) = Service::ALL
                .get(svc_index)
                .and_then(|svc| svc.characteristics().first())
            {
                unsafe { add_char(svc_handle, ch) };
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
            // SAFETY: `add_char` is the active union member for this event.
            let p = unsafe { &(*param).add_char };
            let svc_index = BLE_SERVICE_STEP.load(AtomicOrdering::Relaxed) as usize;
            let char_index = BLE_CHAR_STEP.load(AtomicOrdering::Relaxed) as usize;
            let Some(&ch) = Service::ALL
                .get(svc_index)
                .and_then(|svc| svc.characteristics().get(char_index))
            else {
                return;
            };

            // Sync anything published while registration was in flight.
            BLE_HANDLES[ch.index()].store(p.attr_handle, AtomicOrdering::Release);
            sync_attr(ch, p.attr_handle);
            log::info!("BLE GATTS: {} (handle={})", ch, p.attr_handle);

            if ch.access().notifies() {
                unsafe { add_cccd(BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed)) };
            } else {
                unsafe { register_next(gatts_if) };
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
            unsafe { register_next(gatts_if) };
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            // SAFETY: `connect` is the active union member for this event.
            let p = unsafe { &(*param).connect };
            BLE_CONN_ID.store(p.conn_id, AtomicOrdering::Relaxed);
            BLE_CONNECTED.store(true, AtomicOrdering::Release);
            log::info!("BLE GATTS: client connected (conn_id={})", p.conn_id);
            push_event(Event::ClientConnected);
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            BLE_CONNECTED.store(false, AtomicOrdering::Release);
            log::info!("BLE GATTS: client disconnected");
            push_event(Event::ClientDisconnected);
            // Restart advertising after disconnect.
            let mut params = adv_params();
            unsafe { esp_ble_gap_start_advertising(&mut params) };
        }
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
            // SAFETY: `write` is the active union member for this event.
            let p = unsafe { &(*param).write };
            let Some(ch) = characteristic_for_handle(p.handle) else {
                // CCCD subscriptions and unknown handles.
                return;
            };
            let data = if p.value.is_null() {
                &[][..]
            } else {
                // SAFETY: the stack guarantees `len` readable bytes at `value`
                // for the duration of the callback.
                unsafe { core::slice::from_raw_parts(p.value, p.len as usize) }
            };


            if p.is_prep {
                // Held until EXEC_WRITE; the stack commits the attribute then.
                if let Ok(mut prepared) = BLE_PREPARED.lock() {
                    prepared.prepare(ch, usize::from(p.offset), data);
                }
                return;
            }
            commit_client_write(GattWrite::new(ch, data));
        }
        esp_gatts_cb_event_t_ESP_GATTS_EXEC_WRITE_EVT => {
            // SAFETY: `exec_write` is the active union member for this event.
            let p = unsafe { &(*param).exec_write };
            let Ok(mut prepared) = BLE_PREPARED.lock() else {
                return;
            };
            let mut writes = PreparedWrites::new();
            core::mem::swap(&mut *prepared, &mut writes);
            drop(prepared);

            if u32::from(p.exec_write_flag) == ESP_GATT_PREP_WRITE_EXEC {
                writes.execute(commit_client_write);
            } else {
                log::info!("BLE GATTS: prepared write cancelled");
                writes.cancel();
            }
        }
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// BLE adapter
// ───────────────────────────────────────────────────────────────

/// The peripheral's GATT server.
pub struct BleGattServer {
    #[cfg(not(target_os = "espidf"))]
    values: [CharValue; Characteristic::COUNT],
    /// Simulation: every notify request, in order.
    #[cfg(not(target_os = "espidf"))]
    notifications: Vec<Characteristic>,
    #[cfg(not(target_os = "espidf"))]
    connected: bool,
    #[cfg(not(target_os = "espidf"))]
    advertising: bool,
}

impl Default for BleGattServer {
    fn default() -> Self {
        Self::new()
    }
}

impl BleGattServer {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            values: Default::default(),
            #[cfg(not(target_os = "espidf"))]
            notifications: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            connected: false,
            #[cfg(not(target_os = "espidf"))]
            advertising: false,
        }
    }

    /// Bring up the controller and Bluedroid, set the GAP name and start
    /// attribute registration.  Advertising begins once every attribute
    /// is registered.
    #[cfg(target_os = "espidf")]
    pub fn start(&mut self, device_name: &str) -> Result<(), CommsError> {
        use esp_idf_svc::sys::*;

        let mut name = heapless::Vec::<u8, 33>::new();
        for &b in device_name.as_bytes().iter().take(32) {
            let _ = name.push(b);
        }
        let _ = name.push(0);

        // SAFETY: called once from main() before the event loop; the
        // callbacks registered below only touch the statics above.
        unsafe {
            // Release classic BT memory (BLE-only mode).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            let ret = esp_bt_controller_init(&mut bt_cfg);
            if ret != ESP_OK as i32 {
                return Err(CommsError::ControllerInit(ret));
            }

            let ret = esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE);
            if ret != ESP_OK as i32 {
                return Err(CommsError::ControllerEnable(ret));
            }

            let ret = esp_bluedroid_init();
            if ret != ESP_OK as i32 {
                return Err(CommsError::BluedroidInit(ret));
            }

            let ret = esp_bluedroid_enable();
            if ret != ESP_OK as i32 {
                return Err(CommsError::BluedroidEnable(ret));
            }

            let ret = esp_ble_gap_register_callback(Some(ble_gap_event_handler));
            if ret != ESP_OK as i32 {
                return Err(CommsError::CallbackRegister(ret));
            }
            let ret = esp_ble_gatts_register_callback(Some(ble_gatts_event_handler));
            if ret != ESP_OK as i32 {
                return Err(CommsError::CallbackRegister(ret));
            }

            esp_ble_gap_set_device_name(name.as_ptr().cast());

            let ret = esp_ble_gatts_app_register(0);
            if ret != ESP_OK as i32 {
                return Err(CommsError::AppRegister(ret));
            }
        }

        info!("BLE(espidf): Bluedroid up, registering GATT table as '{}'", device_name);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn start(&mut self, device_name: &str) -> Result<(), CommsError> {
        self.advertising = true;
        info!(
            "BLE(sim): advertising '{}' ({} services)",
            device_name,
            Service::ALL.len()
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    pub fn is_connected(&self) -> bool {
        BLE_CONNECTED.load(AtomicOrdering::Acquire)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    // ── Simulation helpers ────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    pub fn is_advertising(&self) -> bool {
        self.advertising
    }

    /// Simulation: a central connects.  Advertising stops.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_connect(&mut self) {
        self.connected = true;
        self.advertising = false;
    }

    /// Simulation: the central disconnects.  Advertising restarts.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_disconnect(&mut self) {
        self.connected = false;
        self.advertising = true;
    }

    /// Simulation: a client writes `data` to `ch`.
    ///
    /// The stack refuses writes to characteristics without write access
    /// (`None`).  Otherwise it stores the raw bytes, as auto-response does,
    /// and hands back what the GATTS callback would have queued.
    #[cfg(not(target_os = "espidf"))]
    pub fn client_write(&mut self, ch: Characteristic, data: &[u8]) -> Option<GattWrite> {
        if !ch.access().writable() {
            return None;
        }
        self.values[ch.index()] =
            CharValue::from_slice(&data[..data.len().min(crate::gatt::MAX_VALUE_LEN)])
                .unwrap_or_default();
        Some(GattWrite::new(ch, data))
    }

    /// Simulation: a long write of `data` split into `chunk`-byte prepare
    /// fragments, then executed.  The stack stores the whole value, as
    /// auto-response does.
    #[cfg(not(target_os = "espidf"))]
    pub fn client_long_write(
        &mut self,
        ch: Characteristic,
        data: &[u8],
        chunk: usize,
    ) -> Option<GattWrite> {
        if !ch.access().writable() || chunk == 0 {
            return None;
        }
        let mut prepared = PreparedWrites::new();
        for (i, fragment) in data.chunks(chunk).enumerate() {
            prepared.prepare(ch, i * chunk, fragment);
        }
        self.values[ch.index()] =
            CharValue::from_slice(&data[..data.len().min(crate::gatt::MAX_VALUE_LEN)])
                .unwrap_or_default();

        let mut committed = None;
        prepared.execute(|write| committed = Some(write));
        committed
    }

    /// Simulation: every notify request so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn notifications(&self) -> &[Characteristic] {
        &self.notifications
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn take_notifications(&mut self) -> Vec<Characteristic> {
        core::mem::take(&mut self.notifications)
    }
}

// ───────────────────────────────────────────────────────────────
// GattPort implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl GattPort for BleGattServer {
    fn publish(&mut self, ch: Characteristic, value: &[u8]) {
        let value = &value[..value.len().min(MAX_VALUE_LEN)];
        let Ok(handle) = BLE_VALUES.lock().map(|mut values| {
            values[ch.index()] = CharValue::from_slice(value).unwrap_or_default();
            BLE_HANDLES[ch.index()].load(AtomicOrdering::Acquire)
        }) else {
            return;
        };
        if handle != 0 {
            // SAFETY: handle was issued by the stack; value is copied.
            unsafe {
                esp_idf_svc::sys::esp_ble_gatts_set_attr_value(
                    handle,
                    value.len() as u16,
                    value.as_ptr(),
                );
            }
        }
    }

    fn notify(&mut self, ch: Characteristic) {
        if !BLE_CONNECTED.load(AtomicOrdering::Acquire) {
            return;
        }
        let handle = BLE_HANDLES[ch.index()].load(AtomicOrdering::Acquire);
        if handle == 0 {
            return;
        }
        let mut value = self.value(ch);
        // SAFETY: the stack copies the payload before returning.
        unsafe {
            esp_idf_svc::sys::esp_ble_gatts_send_indicate(
                BLE_GATTS_IF.load(AtomicOrdering::Relaxed),
                BLE_CONN_ID.load(AtomicOrdering::Relaxed),
                handle,
                value.len() as u16,
                value.as_mut_ptr(),
                false,
            );
        }
    }

    fn value(&self, ch: Characteristic) -> CharValue {
        BLE_VALUES
            .lock()
            .map(|values| values[ch.index()].clone())
            .unwrap_or_default()
    }
}

#[cfg(not(target_os = "espidf"))]
impl GattPort for BleGattServer {
    fn publish(&mut self, ch: Characteristic, value: &[u8]) {
        let value = &value[..value.len().min(crate::gatt::MAX_VALUE_LEN)];
        self.values[ch.index()] = CharValue::from_slice(value).unwrap_or_default();
    }

    fn notify(&mut self, ch: Characteristic) {
        self.notifications.push(ch);
    }

    fn value(&self, ch: Characteristic) -> CharValue {
        self.values[ch.index()].clone()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
