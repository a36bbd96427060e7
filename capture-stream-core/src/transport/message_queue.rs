//! Fixed-capacity single-producer/single-consumer queue in shared memory.
//!
//! Layout of the anonymous mapping:
//! ```text
//! [QueueHeader: capacity | write_pos | read_pos | event flag word | bound]
//! [padding to align_of::<T>()]
//! [capacity × T]
//! ```
//!
//! Positions are monotonic element counters. The writer publishes
//! `write_pos` with release ordering after copying elements in; the reader
//! publishes `read_pos` with release ordering after copying elements out.
//! Each side loads the other side's position with acquire ordering, so a
//! writer never overwrites an element the reader has not finished with.
//!
//! No locking is involved. A queue is only ever reached for writing through
//! its single [`Producer`] and for reading through its single [`Consumer`];
//! neither half is `Clone` and both move data through `&mut self`, so one
//! writer and one reader is enforced by the type system. The shared
//! [`MessageQueue`] itself only exposes fill levels.
//!
//! ```compile_fail
//! use capture_stream_core::Consumer;
//!
//! fn second_reader<T: Clone>() {}
//! second_reader::<Consumer<u8>>();
//! ```
//!
//! ```compile_fail
//! use capture_stream_core::DataQueue;
//!
//! let (_producer, consumer) = DataQueue::split(8).unwrap();
//! consumer.queue().write(&[1, 2, 3]);
//! ```

use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};
use std::slice;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use memmap2::MmapMut;

use crate::models::error::StreamError;
use crate::models::outcome::ReadOutcome;

/// Byte channel carrying captured audio.
pub type DataQueue = MessageQueue<u8>;

/// Status channel carrying one [`ReadOutcome`] per read attempt.
pub type StatusQueue = MessageQueue<ReadOutcome>;

#[repr(C)]
struct QueueHeader {
    capacity: u64,
    write_pos: AtomicU64,
    read_pos: AtomicU64,
    event_flag: AtomicU32,
    flag_bound: AtomicU32,
}

fn data_offset<T>() -> usize {
    let align = mem::align_of::<T>();
    (mem::size_of::<QueueHeader>() + align - 1) & !(align - 1)
}

pub struct MessageQueue<T: Copy> {
    header: NonNull<QueueHeader>,
    data: NonNull<T>,
    capacity: usize,
    _map: MmapMut,
    _marker: PhantomData<T>,
}

// SAFETY: the mapping is owned by the queue. Element slots are only touched
// by the one `Producer` and the one `Consumer`, following the atomic
// position protocol described in the module docs.
unsafe impl<T: Copy + Send> Send for MessageQueue<T> {}
unsafe impl<T: Copy + Send> Sync for MessageQueue<T> {}

impl<T: Copy> MessageQueue<T> {
    /// Allocate a queue holding up to `capacity` elements and hand out its
    /// two endpoints.
    pub fn split(capacity: usize) -> Result<(Producer<T>, Consumer<T>), StreamError> {
        let queue = Arc::new(Self::new(capacity)?);
        Ok((
            Producer {
                queue: Arc::clone(&queue),
            },
            Consumer { queue },
        ))
    }

    fn new(capacity: usize) -> Result<Self, StreamError> {
        if capacity == 0 {
            return Err(StreamError::InvalidArguments(
                "queue capacity must be positive".into(),
            ));
        }
        if mem::size_of::<T>() == 0 {
            return Err(StreamError::InvalidArguments(
                "queue element type has no size".into(),
            ));
        }

        let offset = data_offset::<T>();
        let len = capacity
            .checked_mul(mem::size_of::<T>())
            .and_then(|bytes| bytes.checked_add(offset))
            .filter(|len| *len <= isize::MAX as usize)
            .ok_or_else(|| {
                StreamError::InvalidArguments(format!("queue capacity {} overflows", capacity))
            })?;

        let mut map = MmapMut::map_anon(len).map_err(|e| {
            StreamError::InvalidArguments(format!("failed to map {} bytes: {}", len, e))
        })?;

        let base = map.as_mut_ptr();
        // SAFETY: the mapping is page aligned, zero filled and at least `len`
        // bytes long, which covers the header and `capacity` elements at `offset`.
        let (header, data) = unsafe {
            let header = base as *mut QueueHeader;
            ptr::write(
                header,
                QueueHeader {
                    capacity: capacity as u64,
                    write_pos: AtomicU64::new(0),
                    read_pos: AtomicU64::new(0),
                    event_flag: AtomicU32::new(0),
                    flag_bound: AtomicU32::new(0),
                },
            );
            (
                NonNull::new_unchecked(header),
                NonNull::new_unchecked(base.add(offset) as *mut T),
            )
        };

        Ok(Self {
            header,
            data,
            capacity,
            _map: map,
            _marker: PhantomData,
        })
    }

    fn header(&self) -> &QueueHeader {
        // SAFETY: initialized in `new` and alive as long as `_map`.
        unsafe { self.header.as_ref() }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available_to_read(&self) -> usize {
        let header = self.header();
        let w = header.write_pos.load(Ordering::Acquire);
        let r = header.read_pos.load(Ordering::Acquire);
        w.saturating_sub(r).min(self.capacity as u64) as usize
    }

    pub fn available_to_write(&self) -> usize {
        self.capacity - self.available_to_read()
    }

    /// # Safety
    ///
    /// The caller must be the only thread writing to this queue.
    unsafe fn write(&self, items: &[T]) -> usize {
        let header = self.header();
        let r = header.read_pos.load(Ordering::Acquire);
        let w = header.write_pos.load(Ordering::Relaxed);
        let used = w.saturating_sub(r).min(self.capacity as u64) as usize;
        let n = (self.capacity - used).min(items.len());
        if n == 0 {
            return 0;
        }

        let start = (w % self.capacity as u64) as usize;
        let first = n.min(self.capacity - start);
        // SAFETY: `start + first <= capacity` and `n - first <= start`, and the
        // slots in `[w, w + n)` are free because `n <= capacity - used`.
        // No other writer exists, so `w` cannot move under us.
        unsafe {
            let data = self.data.as_ptr();
            ptr::copy_nonoverlapping(items.as_ptr(), data.add(start), first);
            if first < n {
                ptr::copy_nonoverlapping(items.as_ptr().add(first), data, n - first);
            }
        }

        header.write_pos.store(w + n as u64, Ordering::Release);
        n
    }

    /// # Safety
    ///
    /// The caller must be the only thread reading from this queue.
    unsafe fn read(&self, out: &mut [T]) -> usize {
        let header = self.header();
        let w = header.write_pos.load(Ordering::Acquire);
        let r = header.read_pos.load(Ordering::Relaxed);
        let available = w.saturating_sub(r).min(self.capacity as u64) as usize;
        let n = available.min(out.len());
        if n == 0 {
            return 0;
        }

        let start = (r % self.capacity as u64) as usize;
        let first = n.min(self.capacity - start);
        // SAFETY: the slots in `[r, r + n)` were published by the writer's
        // release store observed above.
        unsafe {
            let data = self.data.as_ptr();
            ptr::copy_nonoverlapping(data.add(start), out.as_mut_ptr(), first);
            if first < n {
                ptr::copy_nonoverlapping(data, out.as_mut_ptr().add(first), n - first);
            }
        }

        header.read_pos.store(r + n as u64, Ordering::Release);
        n
    }

    /// # Safety
    ///
    /// The caller must be the only thread reading from this queue.
    unsafe fn read_one(&self) -> Option<T> {
        let header = self.header();
        let w = header.write_pos.load(Ordering::Acquire);
        let r = header.read_pos.load(Ordering::Relaxed);
        if w <= r {
            return None;
        }

        let index = (r % self.capacity as u64) as usize;
        // SAFETY: slot `r` was published by the writer and `index < capacity`.
        let item = unsafe { ptr::read(self.data.as_ptr().add(index)) };
        header.read_pos.store(r + 1, Ordering::Release);
        Some(item)
    }

    /// Word shared by the signal group bound to this queue.
    pub(crate) fn event_flag_word(&self) -> &AtomicU32 {
        &self.header().event_flag
    }

    /// Claim the event flag word. Only one signal group may own it.
    pub(crate) fn bind_event_flag(&self) -> bool {
        self.header()
            .flag_bound
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn unbind_event_flag(&self) {
        let header = self.header();
        header.event_flag.store(0, Ordering::Release);
        header.flag_bound.store(0, Ordering::Release);
    }
}

/// Write endpoint of a [`MessageQueue`]. There is exactly one per queue.
pub struct Producer<T: Copy> {
    queue: Arc<MessageQueue<T>>,
}

impl<T: Copy> Producer<T> {
    /// Shared view of the queue, for fill levels and signal binding.
    pub fn queue(&self) -> &Arc<MessageQueue<T>> {
        &self.queue
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn available_to_write(&self) -> usize {
        self.queue.available_to_write()
    }

    /// Copy as many of `items` as fit. Never blocks, never overwrites
    /// unread elements. Returns the number of elements written.
    pub fn write(&mut self, items: &[T]) -> usize {
        // SAFETY: `Producer` is not `Clone` and `write` takes `&mut self`.
        unsafe { self.queue.write(items) }
    }

    /// Write a single element. Returns `false` if the queue is full.
    pub fn write_one(&mut self, item: T) -> bool {
        self.write(slice::from_ref(&item)) == 1
    }
}

/// Read endpoint of a [`MessageQueue`]. There is exactly one per queue.
pub struct Consumer<T: Copy> {
    queue: Arc<MessageQueue<T>>,
}

impl<T: Copy> Consumer<T> {
    /// Shared view of the queue, for fill levels and signal binding.
    pub fn queue(&self) -> &Arc<MessageQueue<T>> {
        &self.queue
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn available_to_read(&self) -> usize {
        self.queue.available_to_read()
    }

    /// Copy up to `out.len()` elements out. Returns the number read.
    pub fn read(&mut self, out: &mut [T]) -> usize {
        // SAFETY: `Consumer` is not `Clone` and `read` takes `&mut self`.
        unsafe { self.queue.read(out) }
    }

    /// Read a single element, if one is available.
    pub fn read_one(&mut self) -> Option<T> {
        // SAFETY: as for `read`.
        unsafe { self.queue.read_one() }
    }
}

impl<T: Copy> std::fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Producer").field(&self.queue).finish()
    }
}

impl<T: Copy> std::fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Consumer").field(&self.queue).finish()
    }
}

impl<T: Copy> std::fmt::Debug for MessageQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageQueue")
            .field("capacity", &self.capacity)
            .field("available_to_read", &self.available_to_read())
            .finish()
    }
}
