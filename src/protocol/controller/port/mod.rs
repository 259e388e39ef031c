//! Software full-CAN controller for one physical channel.
//!
//! A [`ChannelPort`] owns its mailbox table, its FIFOs, its event handler and
//! the serial link it drives. It is invoked synchronously from two sources:
//! the application (configuration, sends, FIFO access) and the transport
//! (`on_bytes_received`, `on_transmit_complete`, `on_bus_state`). Nothing in
//! here blocks; the link reports write completion asynchronously.
//!
//! The transmit pipeline has a single slot: while a block is in flight, further
//! sends only mark their mailbox pending. Each transmit completion starts the
//! lowest-index pending mailbox, so deferred frames are never lost and at most
//! one frame per mailbox waits outside its FIFO.
use crate::{
    config::{
        BITRATE_MAX, BITRATE_MIN, CONTROLLER_CLOCK_HZ, FD_SUPPORT, MAX_CHANNELS,
        TIMESTAMP_RESOLUTION_NS, VERSION_MAJOR, VERSION_MINOR, WIRE_FRAME_SIZE,
    },
    error::{CoreError, DecodeError},
    infra::codec::wire::{deserialize, serialize, WireFrame},
    protocol::{
        controller::{
            fifo::FifoQueue,
            mailbox::{Mailbox, MailboxTable},
            types::{
                Bitrate, BusState, CanState, Direction, DriverState, ErrorKind,
                HardwareDescription, Mode, Statistics, CAN_FEATURE_FD,
            },
        },
        frame::{CanFrame, FrameFormat},
        transport::{CanHandler, LinkDirection, SerialLink},
    },
};

//==================================================================================RX_OUTCOME
/// What happened to a block handed to [`ChannelPort::on_bytes_received`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxOutcome {
    /// The port is not initialised; the block was not inspected.
    Ignored,
    /// Delivered to the receive handler of mailbox `index`.
    Dispatched { index: usize },
    /// Queued in the FIFO bound to mailbox `index`.
    Queued { index: usize },
    /// Counted as an error and reported to the error handler.
    Rejected(RxReject),
}

/// Reason a received block was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxReject {
    Decode(DecodeError),
    NoMatch,
    FifoFull { index: usize },
    Unsupported,
}

//==================================================================================CHANNEL_PORT
/// One emulated CAN channel with `BUFFERS` mailboxes whose FIFOs hold `DEPTH` frames.
pub struct ChannelPort<L, H, const BUFFERS: usize, const DEPTH: usize>
where
    L: SerialLink,
    H: CanHandler,
{
    link: L,
    handler: Option<H>,
    phy_index: u8,
    driver: DriverState,
    mailboxes: MailboxTable<BUFFERS, DEPTH>,
    /// Serialized block handed to the link; stays valid until completion.
    tx_block: WireFrame,
    /// Mailbox and frame currently being written by the link.
    in_flight: Option<(usize, CanFrame)>,
    nominal_bitrate: Bitrate,
    data_bitrate: Bitrate,
    state: CanState,
    statistics: Statistics,
}

impl<L, H, const BUFFERS: usize, const DEPTH: usize> ChannelPort<L, H, BUFFERS, DEPTH>
where
    L: SerialLink,
    H: CanHandler,
{
    /// Create an uninitialised port driving `link`.
    pub fn new(link: L) -> Self {
        Self {
            link,
            handler: None,
            phy_index: 0,
            driver: DriverState::Uninit,
            mailboxes: MailboxTable::new(),
            tx_block: [0; WIRE_FRAME_SIZE],
            in_flight: None,
            nominal_bitrate: Bitrate::None,
            data_bitrate: Bitrate::None,
            state: CanState::default(),
            statistics: Statistics::default(),
        }
    }

    //==============================================================================ACCESSORS
    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn handler(&self) -> Option<&H> {
        self.handler.as_ref()
    }

    pub fn handler_mut(&mut self) -> Option<&mut H> {
        self.handler.as_mut()
    }

    pub fn driver_state(&self) -> DriverState {
        self.driver
    }

    /// Physical channel index (0 while uninitialised).
    pub fn phy_index(&self) -> u8 {
        self.phy_index
    }

    /// Current operating mode, `None` before the first `set_mode`.
    pub fn mode(&self) -> Option<Mode> {
        match self.driver {
            DriverState::Init(mode) => mode,
            DriverState::Uninit => None,
        }
    }

    /// A block is being written by the link.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn mailbox(&self, index: usize) -> Result<&Mailbox<DEPTH>, CoreError> {
        self.check_buffer(index)?;
        self.mailboxes.get(index)
    }

    fn check_init(&self) -> Result<(), CoreError> {
        match self.driver {
            DriverState::Uninit => Err(CoreError::InitMissing),
            DriverState::Init(_) => Ok(()),
        }
    }

    fn check_transmit(&self) -> Result<(), CoreError> {
        if self.link_direction() != LinkDirection::RxTx {
            return Err(CoreError::NotSupported);
        }
        Ok(())
    }

    fn check_buffer(&self, index: usize) -> Result<(), CoreError> {
        self.check_init()?;
        if index >= BUFFERS {
            return Err(CoreError::Buffer {
                index,
                max: BUFFERS,
            });
        }
        Ok(())
    }

    //==============================================================================DRIVER
    /// Initialise the port for physical channel `phy_index` (1-based).
    ///
    /// Resets every mailbox, FIFO binding, counter and the transmit pipeline.
    /// Fails with [`CoreError::InitFail`] on an initialised port.
    pub fn driver_init(&mut self, phy_index: u8, handler: H) -> Result<(), CoreError> {
        if phy_index == 0 || phy_index > MAX_CHANNELS {
            return Err(CoreError::Channel);
        }
        if let DriverState::Init(_) = self.driver {
            #[cfg(feature = "defmt")]
            defmt::warn!("Channel {} already initialised", self.phy_index);
            return Err(CoreError::InitFail);
        }

        self.phy_index = phy_index;
        self.handler = Some(handler);
        self.mailboxes.reset();
        self.in_flight = None;
        self.nominal_bitrate = Bitrate::None;
        self.data_bitrate = Bitrate::None;
        self.state = CanState::default();
        self.statistics = Statistics::default();
        self.driver = DriverState::Init(None);

        #[cfg(feature = "defmt")]
        defmt::info!("Channel {} initialised ({} buffers)", phy_index, BUFFERS);
        Ok(())
    }

    /// Stop the port and return it to the uninitialised state.
    pub fn driver_release(&mut self) -> Result<(), CoreError> {
        self.check_init()?;
        self.set_mode(Mode::Stop)?;
        self.driver = DriverState::Uninit;
        self.handler = None;

        #[cfg(feature = "defmt")]
        defmt::info!("Channel {} released", self.phy_index);
        Ok(())
    }

    /// Replace the event handler.
    pub fn register_handler(&mut self, handler: H) -> Result<(), CoreError> {
        self.check_init()?;
        self.handler = Some(handler);
        Ok(())
    }

    //==============================================================================MODE
    /// Apply an operating mode.
    ///
    /// * `Stop` disables the link, abandons the in-flight and pending sends and
    ///   empties the transmit FIFOs.
    /// * `Operation` enables both directions, resets the statistics and starts
    ///   a pending send.
    /// * `ListenOnly` enables reception only.
    /// * `SelfTest` keeps the link configuration.
    /// * `Sleep` is not available ([`CoreError::NotSupported`]).
    ///
    /// Entering an operating mode clears a previous bus-off condition.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), CoreError> {
        self.check_init()?;

        match mode {
            Mode::Stop => {
                self.link.set_direction(LinkDirection::None);
                self.mailboxes.flush_transmit();
                self.in_flight = None;
                self.state.bus_state = BusState::Init;
            }
            Mode::Operation => {
                self.link.set_direction(LinkDirection::RxTx);
                self.statistics = Statistics::default();
                self.enter_active();
            }
            Mode::ListenOnly => {
                self.link.set_direction(LinkDirection::Rx);
                self.enter_active();
            }
            Mode::SelfTest => self.enter_active(),
            Mode::Sleep => return Err(CoreError::NotSupported),
        }

        self.driver = DriverState::Init(Some(mode));
        #[cfg(feature = "defmt")]
        defmt::info!("Channel {} mode {}", self.phy_index, mode);

        if matches!(mode, Mode::Operation) && self.in_flight.is_none() {
            self.start_next_pending();
        }
        Ok(())
    }

    fn enter_active(&mut self) {
        self.state.bus_state = BusState::Active;
        self.state.rx_error_count = 0;
        self.state.tx_error_count = 0;
    }

    fn link_direction(&self) -> LinkDirection {
        match self.mode() {
            Some(Mode::Operation) => LinkDirection::RxTx,
            Some(Mode::ListenOnly) => LinkDirection::Rx,
            _ => LinkDirection::None,
        }
    }

    //==============================================================================BITRATE
    /// Select the nominal (arbitration) and data-phase bit-rates.
    ///
    /// Rejected with [`CoreError::Bitrate`] when `nominal` is `None` or above
    /// 1 Mbit/s, or when `data` is set but below `nominal`; the previous
    /// configuration is then left untouched.
    ///
    /// The link is released and re-initialised; a block it was writing is
    /// written again once the link is back. If the link fails to initialise,
    /// [`CoreError::Hardware`] is returned, the previous bit-rates stay
    /// recorded and the link stays down until a later `set_bitrate` succeeds.
    pub fn set_bitrate(&mut self, nominal: Bitrate, data: Bitrate) -> Result<(), CoreError> {
        self.check_init()?;

        if nominal == Bitrate::None || nominal.code() > BITRATE_MAX.code() {
            return Err(CoreError::Bitrate);
        }
        if data != Bitrate::None && data.code() < nominal.code() {
            return Err(CoreError::Bitrate);
        }

        self.link.release();
        self.link.init(nominal.serial_baudrate()).map_err(|_err| {
            #[cfg(feature = "defmt")]
            defmt::error!("Channel {} link init failed", self.phy_index);
            CoreError::Hardware
        })?;
        self.link.set_direction(self.link_direction());

        self.nominal_bitrate = nominal;
        self.data_bitrate = data;
        #[cfg(feature = "defmt")]
        defmt::info!(
            "Channel {} bitrate {} / {} (serial {} Bd)",
            self.phy_index,
            nominal,
            data,
            nominal.serial_baudrate()
        );

        if let Some((index, frame)) = self.in_flight.take() {
            if self.check_transmit().is_ok() {
                self.resume_transmit(index, frame);
            } else {
                #[cfg(feature = "defmt")]
                defmt::debug!("Channel {} buffer {} abandoned", self.phy_index, index);
                self.refill_from_fifo(index);
            }
        }
        Ok(())
    }

    /// Current `(nominal, data)` bit-rates.
    pub fn bitrate(&self) -> (Bitrate, Bitrate) {
        (self.nominal_bitrate, self.data_bitrate)
    }

    //==============================================================================BUFFERS
    /// Configure mailbox `index`; the bound FIFO survives reconfiguration.
    pub fn buffer_config(
        &mut self,
        index: usize,
        identifier: u32,
        accept_mask: u32,
        format: FrameFormat,
        direction: Direction,
    ) -> Result<(), CoreError> {
        self.check_buffer(index)?;
        if format.is_fd() && !FD_SUPPORT {
            return Err(CoreError::NotSupported);
        }
        self.mailboxes
            .configure(index, direction, identifier, accept_mask, format)
    }

    /// Invalidate mailbox `index`.
    pub fn buffer_release(&mut self, index: usize) -> Result<(), CoreError> {
        self.check_buffer(index)?;
        self.mailboxes.release(index)
    }

    /// Set the DLC of the resident frame; must be valid for the mailbox format.
    pub fn buffer_set_dlc(&mut self, index: usize, dlc: u8) -> Result<(), CoreError> {
        self.check_buffer(index)?;
        let mailbox = self.mailboxes.get_mut(index)?;
        if dlc > mailbox.format().dlc_max() {
            return Err(CoreError::Param);
        }
        mailbox.frame_mut().set_dlc(dlc);
        Ok(())
    }

    pub fn buffer_get_dlc(&self, index: usize) -> Result<u8, CoreError> {
        Ok(self.mailbox(index)?.frame().dlc())
    }

    /// Copy `data` into the resident frame starting at byte `start`.
    ///
    /// `start + data.len()` must stay within the format capacity (8 or 64).
    pub fn buffer_set_data(&mut self, index: usize, data: &[u8], start: usize) -> Result<(), CoreError> {
        self.check_buffer(index)?;
        let mailbox = self.mailboxes.get_mut(index)?;
        let end = data_window(start, data.len(), mailbox.format())?;
        mailbox.frame_mut().raw_data_mut()[start..end].copy_from_slice(data);
        Ok(())
    }

    /// Copy bytes of the resident frame, starting at `start`, into `dest`.
    pub fn buffer_get_data(&self, index: usize, dest: &mut [u8], start: usize) -> Result<(), CoreError> {
        let mailbox = self.mailbox(index)?;
        let end = data_window(start, dest.len(), mailbox.format())?;
        dest.copy_from_slice(&mailbox.frame().raw_data()[start..end]);
        Ok(())
    }

    /// Transmit the resident frame of mailbox `index`.
    ///
    /// With the link busy the mailbox is marked pending and the call succeeds;
    /// the frame leaves on a later transmit completion. Outside `Operation`
    /// the link does not transmit and the call fails with
    /// [`CoreError::NotSupported`].
    pub fn buffer_send(&mut self, index: usize) -> Result<(), CoreError> {
        self.check_buffer(index)?;
        self.check_transmit()?;
        let mailbox = self.mailboxes.get_mut(index)?;
        if !mailbox.is_valid() {
            return Err(CoreError::Param);
        }

        if self.in_flight.is_some() {
            mailbox.set_pending(true);
            #[cfg(feature = "defmt")]
            defmt::debug!("Channel {} link busy, buffer {} pending", self.phy_index, index);
            return Ok(());
        }

        self.transmit(index)
    }

    fn transmit(&mut self, index: usize) -> Result<(), CoreError> {
        let mailbox = self.mailboxes.get_mut(index)?;
        let frame = *mailbox.frame();
        self.tx_block = serialize(&frame);

        match self.link.write(&self.tx_block) {
            Ok(()) => {
                mailbox.set_pending(false);
                self.in_flight = Some((index, frame));
                #[cfg(feature = "defmt")]
                defmt::trace!("Channel {} sending buffer {}", self.phy_index, index);
                Ok(())
            }
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::error!("Channel {} link write failed", self.phy_index);
                self.report_error(ErrorKind::Transport);
                Err(CoreError::Hardware)
            }
        }
    }

    //==============================================================================FIFOS
    /// Bind `fifo` to mailbox `index`, returning the previously bound queue.
    pub fn fifo_config(
        &mut self,
        index: usize,
        fifo: FifoQueue<DEPTH>,
    ) -> Result<Option<FifoQueue<DEPTH>>, CoreError> {
        self.check_buffer(index)?;
        if fifo.capacity() == 0 {
            return Err(CoreError::FifoParam);
        }
        self.mailboxes.bind_fifo(index, fifo)
    }

    /// Unbind and return the FIFO of mailbox `index`.
    pub fn fifo_release(&mut self, index: usize) -> Result<Option<FifoQueue<DEPTH>>, CoreError> {
        self.check_buffer(index)?;
        self.mailboxes.release_fifo(index)
    }

    /// Dequeue the oldest frame of the FIFO bound to mailbox `index`.
    pub fn fifo_read(&mut self, index: usize) -> Result<CanFrame, CoreError> {
        self.check_buffer(index)?;
        let fifo = self
            .mailboxes
            .get_mut(index)?
            .fifo_mut()
            .ok_or(CoreError::InitMissing)?;
        Ok(fifo.pop()?)
    }

    /// Send `frame` through mailbox `index`, queueing behind earlier frames.
    ///
    /// When the mailbox is pending or its FIFO already holds frames, `frame`
    /// is appended to the FIFO so send order is preserved; otherwise it
    /// becomes the resident frame and is sent (or deferred) right away.
    /// With nothing in flight the head of the queue is started at once.
    pub fn fifo_write(&mut self, index: usize, frame: &CanFrame) -> Result<(), CoreError> {
        self.check_buffer(index)?;
        self.check_transmit()?;
        let mailbox = self.mailboxes.get_mut(index)?;
        let pending = mailbox.is_pending();
        let fifo = mailbox.fifo_mut().ok_or(CoreError::InitMissing)?;

        if pending || !fifo.is_empty() {
            let queued = fifo.push(*frame).map_err(|err| {
                #[cfg(feature = "defmt")]
                defmt::warn!("Channel {} transmit FIFO {} full", self.phy_index, index);
                CoreError::from(err)
            });
            if self.in_flight.is_none() {
                self.refill_from_fifo(index);
                self.start_next_pending();
            }
            return queued;
        }

        *mailbox.frame_mut() = *frame;
        self.buffer_send(index)
    }

    //==============================================================================STATUS
    pub fn statistics(&self) -> Result<Statistics, CoreError> {
        self.check_init()?;
        Ok(self.statistics)
    }

    pub fn can_state(&self) -> Result<CanState, CoreError> {
        self.check_init()?;
        Ok(self.state)
    }

    pub fn hardware_description(&self) -> Result<HardwareDescription, CoreError> {
        self.check_init()?;
        Ok(HardwareDescription {
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            can_features: if FD_SUPPORT { CAN_FEATURE_FD } else { 0 },
            driver_features: 0,
            max_buffers: BUFFERS,
            timestamp_resolution_ns: TIMESTAMP_RESOLUTION_NS,
            clock_hz: CONTROLLER_CLOCK_HZ,
            bitrate_min: BITRATE_MIN,
            bitrate_max: BITRATE_MAX,
            nominal_bitrate: self.nominal_bitrate,
            data_bitrate: self.data_bitrate,
        })
    }

    //==============================================================================TRANSPORT_ENTRY_POINTS
    /// Dispatch a block received from the link.
    ///
    /// The block is decoded, matched against the receive mailboxes and either
    /// queued in the bound FIFO or handed to the receive handler. Failures are
    /// counted and reported to the error handler; they never stop the channel.
    pub fn on_bytes_received(&mut self, bytes: &[u8]) -> RxOutcome {
        if self.check_init().is_err() {
            return RxOutcome::Ignored;
        }

        let frame = match deserialize(bytes) {
            Ok(frame) => frame,
            Err(err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Channel {} dropped block: {}", self.phy_index, err);
                self.report_error(ErrorKind::Decode);
                return RxOutcome::Rejected(RxReject::Decode(err));
            }
        };

        if frame.is_fd() && !FD_SUPPORT {
            self.report_error(ErrorKind::Unsupported);
            return RxOutcome::Rejected(RxReject::Unsupported);
        }

        let Some(index) =
            self.mailboxes
                .match_incoming(frame.identifier(), frame.format(), Direction::Receive)
        else {
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "Channel {} no mailbox for id {=u32:#x}",
                self.phy_index,
                frame.identifier()
            );
            self.report_error(ErrorKind::NoMatch);
            return RxOutcome::Rejected(RxReject::NoMatch);
        };

        self.statistics.received = self.statistics.received.wrapping_add(1);

        let Ok(mailbox) = self.mailboxes.get_mut(index) else {
            return RxOutcome::Rejected(RxReject::NoMatch);
        };
        *mailbox.frame_mut() = frame;

        if let Some(fifo) = mailbox.fifo_mut() {
            if fifo.push(frame).is_err() {
                mailbox.frame_mut().set_overrun(true);
                #[cfg(feature = "defmt")]
                defmt::warn!("Channel {} receive FIFO {} full", self.phy_index, index);
                self.report_error(ErrorKind::FifoOverflow);
                return RxOutcome::Rejected(RxReject::FifoFull { index });
            }
            return RxOutcome::Queued { index };
        }

        if let Some(handler) = self.handler.as_mut() {
            handler.on_receive(&frame, index);
        }
        RxOutcome::Dispatched { index }
    }

    /// Handle completion of the block handed to the link.
    ///
    /// Clears the busy state, reports the sent frame, refills the mailbox from
    /// its FIFO and starts the lowest-index pending mailbox (in `Operation`
    /// only). Returns the index of the mailbox whose transmission was started,
    /// if any.
    pub fn on_transmit_complete(&mut self) -> Option<usize> {
        self.check_init().ok()?;

        if let Some((index, frame)) = self.in_flight.take() {
            self.statistics.transmitted = self.statistics.transmitted.wrapping_add(1);
            if let Some(handler) = self.handler.as_mut() {
                handler.on_transmit_complete(&frame, index);
            }
            self.refill_from_fifo(index);
        }

        self.start_next_pending()
    }

    fn start_next_pending(&mut self) -> Option<usize> {
        self.check_transmit().ok()?;
        let next = self.mailboxes.first_pending()?;
        self.transmit(next).ok().map(|()| next)
    }

    /// Write `frame` again after the link was re-opened under it.
    fn resume_transmit(&mut self, index: usize, frame: CanFrame) {
        self.tx_block = serialize(&frame);
        match self.link.write(&self.tx_block) {
            Ok(()) => self.in_flight = Some((index, frame)),
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::error!("Channel {} link write failed", self.phy_index);
                self.report_error(ErrorKind::Transport);
                self.refill_from_fifo(index);
            }
        }
    }

    fn refill_from_fifo(&mut self, index: usize) {
        let Ok(mailbox) = self.mailboxes.get_mut(index) else {
            return;
        };
        if mailbox.is_pending() {
            return;
        }
        let next = match mailbox.fifo_mut().map(|fifo| fifo.pop()) {
            Some(Ok(frame)) => frame,
            _ => return,
        };
        *mailbox.frame_mut() = next;
        mailbox.set_pending(true);
    }

    /// Record a bus-state change reported by the transport.
    ///
    /// `Warn`, `Passive` and `Off` count as error frames. Every change is
    /// delivered to the error handler.
    pub fn on_bus_state(&mut self, bus_state: BusState, rx_errors: u8, tx_errors: u8) {
        if self.check_init().is_err() {
            return;
        }

        self.state.bus_state = bus_state;
        self.state.rx_error_count = rx_errors;
        self.state.tx_error_count = tx_errors;

        if matches!(bus_state, BusState::Warn | BusState::Passive | BusState::Off) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Channel {} bus state {}", self.phy_index, bus_state);
            self.report_error(ErrorKind::Bus);
        } else if let Some(handler) = self.handler.as_mut() {
            handler.on_error(&self.state);
        }
    }

    fn report_error(&mut self, kind: ErrorKind) {
        self.statistics.errors = self.statistics.errors.wrapping_add(1);
        self.state.last_error = kind;
        if let Some(handler) = self.handler.as_mut() {
            handler.on_error(&self.state);
        }
    }
}

/// End of a `start..start + len` window inside the data area of `format`.
fn data_window(start: usize, len: usize, format: FrameFormat) -> Result<usize, CoreError> {
    match start.checked_add(len) {
        Some(end) if end <= format.data_size_max() => Ok(end),
        _ => Err(CoreError::Param),
    }
}
